#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::ffi::{CStr, CString};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use scard::backend::{PcscBackend, Pci};
use scard::ffi::constants::*;
use scard::ffi::{Dword, ScardContext, ScardHandle, ScardReaderState, ScardStatus};
use scard::{multi_string, Context, ErrorKind, Scope};

pub const READER: &str = "ACS ACR122U PICC Interface 00 00";
pub const SECOND_READER: &str = "Yubico YubiKey OTP+FIDO+CCID 01 00";
pub const ATR: &[u8] = &[0x3b, 0x8f, 0x80, 0x01, 0x80, 0x4f, 0x0c, 0xa0, 0x00, 0x00, 0x03, 0x06, 0x03, 0x00, 0x01];
pub const SW_SUCCESS: &[u8] = &[0x90, 0x00];

pub fn status(kind: ErrorKind) -> ScardStatus {
    u32::from(kind) as ScardStatus
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCard {
    pub reader: String,
    pub protocol: Dword,
    pub in_transaction: bool,
}

/// Observable and configurable state of [MockBackend].
#[derive(Debug)]
pub struct MockState {
    pub readers: Vec<String>,
    /// `dwEventState` reported for every known reader, event counter included.
    pub reader_event_state: Dword,
    pub atr: Vec<u8>,
    /// Protocol negotiated when T=1 is not requested.
    pub card_protocol: Dword,
    pub contexts: HashSet<ScardContext>,
    pub cards: HashMap<ScardHandle, MockCard>,
    pub next_handle: u32,
    pub attributes: HashMap<Dword, Vec<u8>>,
    /// Returned by the sizing call of `get_attrib` for an attribute that is not in `attributes`.
    pub unsupported_attribute_status: ErrorKind,
    pub card_response: Vec<u8>,
    pub control_response: Vec<u8>,
    /// Makes the sizing call of `status` fail with `SCARD_E_INSUFFICIENT_BUFFER`, as some implementations do.
    pub status_sizing_insufficient_buffer: bool,
    /// Forced failures, consumed by the next matching call: a primitive name or an exact call.
    pub failures: HashMap<&'static str, ErrorKind>,
    pub cancel_requested: bool,
    pub calls: Vec<String>,
    pub transmitted: Vec<(Pci, Vec<u8>)>,
    pub controlled: Vec<(Dword, Option<Vec<u8>>)>,
    pub dispositions: Vec<Dword>,
    pub last_groups: Option<Vec<u8>>,
    pub last_timeout: Option<Dword>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            readers: vec![READER.to_owned()],
            reader_event_state: SCARD_STATE_PRESENT,
            atr: ATR.to_vec(),
            card_protocol: SCARD_PROTOCOL_T0,
            contexts: HashSet::new(),
            cards: HashMap::new(),
            next_handle: 0x100,
            attributes: HashMap::new(),
            unsupported_attribute_status: ErrorKind::Unexpected,
            card_response: SW_SUCCESS.to_vec(),
            control_response: Vec::new(),
            status_sizing_insufficient_buffer: false,
            failures: HashMap::new(),
            cancel_requested: false,
            calls: Vec::new(),
            transmitted: Vec::new(),
            controlled: Vec::new(),
            dispositions: Vec::new(),
            last_groups: None,
            last_timeout: None,
        }
    }
}

/// In-memory PC/SC resource manager with one card in every reader.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    cancelled: Condvar,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_state(configure: impl FnOnce(&mut MockState)) -> Arc<Self> {
        let backend = Self::new();
        configure(&mut backend.state());
        backend
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn fail_next(&self, primitive: &'static str, kind: ErrorKind) {
        self.state().failures.insert(primitive, kind);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn enter(&self, call: String) -> Result<MutexGuard<'_, MockState>, ScardStatus> {
        let mut state = self.state();
        let primitive = call.split('(').next().unwrap_or_default().to_owned();

        // An exact call such as `list_readers(buffer)` takes precedence over the primitive name.
        let failure = state
            .failures
            .remove(call.as_str())
            .or_else(|| state.failures.remove(primitive.as_str()));
        state.calls.push(call);

        match failure {
            Some(kind) => Err(status(kind)),
            None => Ok(state),
        }
    }

    fn allocate_handle(state: &mut MockState) -> u32 {
        state.next_handle += 1;
        state.next_handle
    }
}

pub fn context(backend: &Arc<MockBackend>) -> Context {
    Context::establish_with(Arc::clone(backend) as Arc<dyn PcscBackend>, Scope::User).unwrap()
}

fn negotiate(state: &MockState, preferred_protocols: Dword) -> Dword {
    if preferred_protocols & SCARD_PROTOCOL_T1 != 0 {
        SCARD_PROTOCOL_T1
    } else if preferred_protocols & state.card_protocol != 0 {
        state.card_protocol
    } else {
        SCARD_PROTOCOL_UNDEFINED
    }
}

/// Copies `data` into `buf` the way the native functions do: `None` asks for the length only.
fn write_out(data: &[u8], buf: Option<&mut [u8]>, len: &mut Dword) -> ScardStatus {
    match buf {
        None => {
            *len = data.len() as Dword;
            SCARD_S_SUCCESS
        }
        Some(buf) if buf.len() < data.len() || (*len as usize) < data.len() => {
            *len = data.len() as Dword;
            status(ErrorKind::InsufficientBuffer)
        }
        Some(buf) => {
            buf[..data.len()].copy_from_slice(data);
            *len = data.len() as Dword;
            SCARD_S_SUCCESS
        }
    }
}

macro_rules! enter {
    ($self:ident, $($call:tt)*) => {
        match $self.enter(format!($($call)*)) {
            Ok(state) => state,
            Err(status) => return status,
        }
    };
}

impl PcscBackend for MockBackend {
    fn establish_context(&self, scope: Dword, context: &mut ScardContext) -> ScardStatus {
        let mut state = enter!(self, "establish_context({scope})");

        let handle = Self::allocate_handle(&mut state) as ScardContext;
        state.contexts.insert(handle);
        *context = handle;

        SCARD_S_SUCCESS
    }

    fn release_context(&self, context: ScardContext) -> ScardStatus {
        let mut state = enter!(self, "release_context");

        if state.contexts.remove(&context) {
            SCARD_S_SUCCESS
        } else {
            status(ErrorKind::InvalidHandle)
        }
    }

    fn is_valid_context(&self, context: ScardContext) -> ScardStatus {
        let state = enter!(self, "is_valid_context");

        if state.contexts.contains(&context) {
            SCARD_S_SUCCESS
        } else {
            status(ErrorKind::InvalidHandle)
        }
    }

    fn cancel(&self, context: ScardContext) -> ScardStatus {
        let mut state = enter!(self, "cancel");

        if !state.contexts.contains(&context) {
            return status(ErrorKind::InvalidHandle);
        }
        state.cancel_requested = true;
        self.cancelled.notify_all();

        SCARD_S_SUCCESS
    }

    fn list_readers(
        &self,
        context: ScardContext,
        groups: Option<&[u8]>,
        readers: Option<&mut [u8]>,
        readers_len: &mut Dword,
    ) -> ScardStatus {
        let mut state = enter!(self, "list_readers({})", if readers.is_some() { "buffer" } else { "null" });

        if !state.contexts.contains(&context) {
            return status(ErrorKind::InvalidHandle);
        }
        state.last_groups = groups.map(<[u8]>::to_vec);
        if state.readers.is_empty() {
            return status(ErrorKind::NoReadersAvailable);
        }

        write_out(&multi_string::encode(&state.readers), readers, readers_len)
    }

    fn connect(
        &self,
        context: ScardContext,
        reader: &CStr,
        share_mode: Dword,
        preferred_protocols: Dword,
        card: &mut ScardHandle,
        active_protocol: &mut Dword,
    ) -> ScardStatus {
        let mut state = enter!(self, "connect({share_mode}, {preferred_protocols})");

        if !state.contexts.contains(&context) {
            return status(ErrorKind::InvalidHandle);
        }
        let reader = reader.to_string_lossy().into_owned();
        if !state.readers.contains(&reader) {
            return status(ErrorKind::UnknownReader);
        }

        let protocol = negotiate(&state, preferred_protocols);
        if share_mode != SCARD_SHARE_DIRECT && protocol == SCARD_PROTOCOL_UNDEFINED {
            return status(ErrorKind::ProtoMismatch);
        }

        let handle = Self::allocate_handle(&mut state) as ScardHandle;
        state.cards.insert(
            handle,
            MockCard {
                reader,
                protocol,
                in_transaction: false,
            },
        );
        *card = handle;
        *active_protocol = protocol;

        SCARD_S_SUCCESS
    }

    fn reconnect(
        &self,
        card: ScardHandle,
        share_mode: Dword,
        preferred_protocols: Dword,
        initialization: Dword,
        active_protocol: &mut Dword,
    ) -> ScardStatus {
        let mut state = enter!(self, "reconnect({share_mode}, {preferred_protocols}, {initialization})");

        let protocol = negotiate(&state, preferred_protocols);
        let Some(mock_card) = state.cards.get_mut(&card) else {
            return status(ErrorKind::InvalidHandle);
        };
        mock_card.protocol = protocol;
        *active_protocol = protocol;

        SCARD_S_SUCCESS
    }

    fn disconnect(&self, card: ScardHandle, disposition: Dword) -> ScardStatus {
        let mut state = enter!(self, "disconnect({disposition})");

        if state.cards.remove(&card).is_none() {
            return status(ErrorKind::InvalidHandle);
        }
        state.dispositions.push(disposition);

        SCARD_S_SUCCESS
    }

    fn begin_transaction(&self, card: ScardHandle) -> ScardStatus {
        let mut state = enter!(self, "begin_transaction");

        match state.cards.get_mut(&card) {
            Some(card) => {
                card.in_transaction = true;
                SCARD_S_SUCCESS
            }
            None => status(ErrorKind::InvalidHandle),
        }
    }

    fn end_transaction(&self, card: ScardHandle, disposition: Dword) -> ScardStatus {
        let mut state = enter!(self, "end_transaction({disposition})");

        match state.cards.get_mut(&card) {
            Some(card) if card.in_transaction => {
                card.in_transaction = false;
                SCARD_S_SUCCESS
            }
            Some(_) => status(ErrorKind::NotTransacted),
            None => status(ErrorKind::InvalidHandle),
        }
    }

    fn status(
        &self,
        card: ScardHandle,
        reader_names: Option<&mut [u8]>,
        reader_names_len: &mut Dword,
        state: &mut Dword,
        protocol: &mut Dword,
        atr: Option<&mut [u8]>,
        atr_len: &mut Dword,
    ) -> ScardStatus {
        let sizing = reader_names.is_none() && atr.is_none();
        let mock = enter!(self, "status({})", if sizing { "null" } else { "buffer" });

        let Some(mock_card) = mock.cards.get(&card) else {
            return status(ErrorKind::InvalidHandle);
        };
        let names = multi_string::encode([mock_card.reader.as_str()]);

        *state = SCARD_PRESENT | SCARD_POWERED | SCARD_NEGOTIABLE;
        if cfg!(target_os = "windows") {
            *state = SCARD_SPECIFIC;
        }
        *protocol = mock_card.protocol;

        if sizing && mock.status_sizing_insufficient_buffer {
            *reader_names_len = names.len() as Dword;
            *atr_len = mock.atr.len() as Dword;
            return status(ErrorKind::InsufficientBuffer);
        }

        let names_status = write_out(&names, reader_names, reader_names_len);
        let atr_status = write_out(&mock.atr, atr, atr_len);
        if names_status != SCARD_S_SUCCESS {
            names_status
        } else {
            atr_status
        }
    }

    fn get_status_change(
        &self,
        context: ScardContext,
        timeout: Dword,
        reader_states: &mut [ScardReaderState],
    ) -> ScardStatus {
        let mut state = enter!(self, "get_status_change({timeout})");

        if !state.contexts.contains(&context) {
            return status(ErrorKind::InvalidHandle);
        }
        state.last_timeout = Some(timeout);

        let mut changed = false;
        for reader_state in reader_states.iter_mut() {
            // SAFETY: the reader name is a NUL-terminated string owned by the caller for the duration of the call.
            let name = unsafe { CStr::from_ptr(reader_state.sz_reader.cast()) }
                .to_string_lossy()
                .into_owned();
            let current = reader_state.dw_current_state;

            let event = if state.readers.contains(&name) {
                let mut rgb_atr = [0; scard::platform::MAX_ATR_SIZE];
                rgb_atr[..state.atr.len()].copy_from_slice(&state.atr);
                reader_state.rgb_atr = rgb_atr;
                reader_state.cb_atr = state.atr.len() as Dword;

                state.reader_event_state
            } else {
                SCARD_STATE_UNKNOWN
            };

            if event & 0xffff != current {
                reader_state.dw_event_state = event | SCARD_STATE_CHANGED;
                changed = true;
            } else {
                reader_state.dw_event_state = event;
            }
        }

        if changed {
            return SCARD_S_SUCCESS;
        }
        if timeout == 0 {
            return status(ErrorKind::Timeout);
        }

        let wait = if timeout == SCARD_INFINITE {
            Duration::from_secs(30)
        } else {
            Duration::from_millis(timeout as u64)
        };
        let (mut state, result) = self
            .cancelled
            .wait_timeout_while(state, wait, |state| !state.cancel_requested)
            .unwrap();

        if result.timed_out() {
            status(ErrorKind::Timeout)
        } else {
            state.cancel_requested = false;
            status(ErrorKind::Cancelled)
        }
    }

    fn transmit(
        &self,
        card: ScardHandle,
        pci: Pci,
        send: &[u8],
        recv: &mut [u8],
        recv_len: &mut Dword,
    ) -> ScardStatus {
        let mut state = enter!(self, "transmit({pci:?})");

        if !state.cards.contains_key(&card) {
            return status(ErrorKind::InvalidHandle);
        }
        state.transmitted.push((pci, send.to_vec()));

        let response = state.card_response.clone();
        write_out(&response, Some(recv), recv_len)
    }

    fn control(
        &self,
        card: ScardHandle,
        control_code: Dword,
        send: Option<&[u8]>,
        recv: Option<&mut [u8]>,
        bytes_returned: &mut Dword,
    ) -> ScardStatus {
        let mut state = enter!(self, "control({control_code:#x})");

        if !state.cards.contains_key(&card) {
            return status(ErrorKind::InvalidHandle);
        }
        state.controlled.push((control_code, send.map(<[u8]>::to_vec)));

        match recv {
            Some(recv) => {
                let len = state.control_response.len().min(recv.len());
                recv[..len].copy_from_slice(&state.control_response[..len]);
                *bytes_returned = len as Dword;
            }
            None => *bytes_returned = 0,
        }

        SCARD_S_SUCCESS
    }

    fn get_attrib(
        &self,
        card: ScardHandle,
        attr_id: Dword,
        attr: Option<&mut [u8]>,
        attr_len: &mut Dword,
    ) -> ScardStatus {
        let state = enter!(self, "get_attrib({attr_id:#x})");

        if !state.cards.contains_key(&card) {
            return status(ErrorKind::InvalidHandle);
        }

        match state.attributes.get(&attr_id) {
            Some(value) => write_out(value, attr, attr_len),
            None => status(state.unsupported_attribute_status),
        }
    }
}

pub fn reader_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

pub fn c_string(value: &str) -> CString {
    CString::new(value).unwrap()
}
