use std::ffi::CStr;

use bitflags::bitflags;
use ffi_types::constants::*;
use ffi_types::ScardReaderState;

use crate::platform::{self, NativeWord, MAX_ATR_SIZE};
use crate::{Error, Result};

bitflags! {
    /// [SCARD_READERSTATE](https://learn.microsoft.com/en-us/windows/win32/api/winscard/ns-winscard-scard_readerstatea)
    ///
    /// `dwCurrentState` and `dwEventState` flags. The empty set is `SCARD_STATE_UNAWARE`: the application does not
    /// know the current state and wants to be told.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct State: u32 {
        /// This reader should be ignored.
        const IGNORE = 0x0001;
        /// There is a difference between the state believed by the application and the actual state.
        const CHANGED = 0x0002;
        /// The given reader name is not recognized by the resource manager.
        const UNKNOWN = 0x0004;
        /// The actual state of this reader is not available.
        const UNAVAILABLE = 0x0008;
        /// There is no card in the reader.
        const EMPTY = 0x0010;
        /// There is a card in the reader.
        const PRESENT = 0x0020;
        /// There is a card in the reader with an ATR matching one of the target cards.
        const ATRMATCH = 0x0040;
        /// The card in the reader is allocated for exclusive use by another application.
        const EXCLUSIVE = 0x0080;
        /// The card in the reader is in use by one or more other applications, but may be connected to in shared mode.
        const INUSE = 0x0100;
        /// There is an unresponsive card in the reader.
        const MUTE = 0x0200;
        /// The card in the reader has not been powered up.
        const UNPOWERED = 0x0400;
    }
}

impl State {
    /// No flag is set.
    pub fn is_unaware(self) -> bool {
        self.is_empty()
    }

    /// Decodes a native `dwCurrentState`/`dwEventState`.
    ///
    /// pcsc-lite keeps an event counter in the upper 16 bits of `dwEventState`; it is not a flag and is dropped.
    pub fn from_native(value: u64) -> Self {
        State::from_bits_truncate((value & 0xffff) as u32)
    }

    /// Native `DWORD` value.
    pub fn to_native(self) -> ffi_types::Dword {
        [
            (State::IGNORE, SCARD_STATE_IGNORE),
            (State::CHANGED, SCARD_STATE_CHANGED),
            (State::UNKNOWN, SCARD_STATE_UNKNOWN),
            (State::UNAVAILABLE, SCARD_STATE_UNAVAILABLE),
            (State::EMPTY, SCARD_STATE_EMPTY),
            (State::PRESENT, SCARD_STATE_PRESENT),
            (State::ATRMATCH, SCARD_STATE_ATRMATCH),
            (State::EXCLUSIVE, SCARD_STATE_EXCLUSIVE),
            (State::INUSE, SCARD_STATE_INUSE),
            (State::MUTE, SCARD_STATE_MUTE),
            (State::UNPOWERED, SCARD_STATE_UNPOWERED),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .fold(SCARD_STATE_UNAWARE, |native, (_, bit)| native | bit)
    }
}

/// State of one reader, as passed to and returned by [crate::Context::get_status_change].
///
/// A value is never mutated: a poll returns new values, and [ReaderState::update] prepares the next poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReaderState {
    reader: String,
    current_state: State,
    event_state: State,
    atr: Vec<u8>,
}

impl ReaderState {
    /// Creates an unaware state for `reader`.
    pub fn new(reader: impl Into<String>) -> Self {
        Self {
            reader: reader.into(),
            current_state: State::empty(),
            event_state: State::empty(),
            atr: Vec::new(),
        }
    }

    /// Sets the state the application believes the reader is in.
    pub fn with_current_state(mut self, current_state: State) -> Self {
        self.current_state = current_state;
        self
    }

    /// Sets the ATR to match against. Rejected at poll time if it exceeds [MAX_ATR_SIZE].
    pub fn with_atr(mut self, atr: impl Into<Vec<u8>>) -> Self {
        self.atr = atr.into();
        self
    }

    pub fn reader(&self) -> &str {
        &self.reader
    }

    pub fn current_state(&self) -> State {
        self.current_state
    }

    pub fn event_state(&self) -> State {
        self.event_state
    }

    pub fn atr(&self) -> &[u8] {
        &self.atr
    }

    /// Prepares the next poll: the observed state becomes the believed state, and the event state is reset.
    pub fn update(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            current_state: self.event_state,
            event_state: State::empty(),
            atr: self.atr.clone(),
        }
    }

    /// Fills a native structure. `reader` is the NUL-terminated copy of [ReaderState::reader] and must outlive the
    /// returned value.
    pub(crate) fn to_native(&self, reader: &CStr) -> Result<ScardReaderState> {
        if self.atr.len() > MAX_ATR_SIZE {
            return Err(Error::precondition(format!(
                "ATR of {} bytes does not fit into {} bytes",
                self.atr.len(),
                MAX_ATR_SIZE
            )));
        }

        let mut rgb_atr = [0; MAX_ATR_SIZE];
        rgb_atr[..self.atr.len()].copy_from_slice(&self.atr);

        Ok(ScardReaderState {
            sz_reader: reader.as_ptr().cast(),
            pv_user_data: std::ptr::null_mut(),
            dw_current_state: self.current_state.to_native(),
            dw_event_state: self.event_state.to_native(),
            cb_atr: platform::dword_len(self.atr.len())?,
            rgb_atr,
        })
    }

    /// Reads a native structure back after the native call has updated it.
    pub(crate) fn from_native(reader: &str, native: &ScardReaderState) -> Self {
        // Copies: the structure is packed on macOS.
        let current_state = native.dw_current_state;
        let event_state = native.dw_event_state;
        let cb_atr = native.cb_atr;
        let rgb_atr = native.rgb_atr;

        let atr_len = platform::usize_len(cb_atr).min(MAX_ATR_SIZE);

        Self {
            reader: reader.to_owned(),
            current_state: State::from_native(current_state.to_u64()),
            event_state: State::from_native(event_state.to_u64()),
            atr: rgb_atr[..atr_len].to_vec(),
        }
    }
}
