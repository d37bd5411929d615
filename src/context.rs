use std::ffi::CString;
use std::sync::Arc;
use std::time::Duration;

use ffi_types::{Dword, ScardContext, ScardHandle};

use crate::backend::{self, PcscBackend};
use crate::platform::{self, NativeWord};
use crate::types::timeout_millis;
use crate::{multi_string, Card, Error, ErrorKind, Protocol, ReaderState, Result, Scope, ShareMode};

/// Shortest reader list that holds a reader: one single-character name and two terminators.
const MIN_READERS_LEN: usize = 3;

/// A PC/SC resource manager context (`SCARDCONTEXT`).
///
/// Every operation except [Context::release] and [Context::is_valid] fails with [Error::Precondition] once the
/// context is released. Dropping an established context releases it, and a failed release is logged with `warn!`.
///
/// [Card]s connected through the context do not borrow it. Disconnect them before releasing the context: a card that
/// outlives its context is disconnected when dropped, and if the library refuses, that failure is only logged.
#[derive(Debug)]
pub struct Context {
    backend: Arc<dyn PcscBackend>,
    handle: Option<ScardContext>,
    scope: Scope,
}

impl Context {
    /// Establishes a context with the system smart card library.
    ///
    /// Equivalent to `SCardEstablishContext`.
    pub fn establish(scope: Scope) -> Result<Self> {
        Self::establish_with(backend::system()?, scope)
    }

    /// Establishes a context with the given backend.
    #[instrument(level = "debug", skip(backend))]
    pub fn establish_with(backend: Arc<dyn PcscBackend>, scope: Scope) -> Result<Self> {
        let mut handle: ScardContext = 0;
        try_execute!(backend.establish_context(scope.into(), &mut handle))?;

        if handle == 0 {
            return Err(Error::InvalidData(
                "the smart card library returned a null context handle".to_owned(),
            ));
        }
        debug!(handle = handle.to_u64(), "Context is established");

        Ok(Self {
            backend,
            handle: Some(handle),
            scope,
        })
    }

    /// Scope the context was established with.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Native handle widened to 64 bits, `None` once released.
    pub fn handle(&self) -> Option<u64> {
        self.handle.map(NativeWord::to_u64)
    }

    fn raw_handle(&self) -> Result<ScardContext> {
        self.handle
            .ok_or_else(|| Error::precondition("the smart card context is already released"))
    }

    /// Releases the context. Releasing a released context does nothing.
    ///
    /// Equivalent to `SCardReleaseContext`. If the native call fails, the context stays established.
    #[instrument(level = "debug", skip(self))]
    pub fn release(&mut self) -> Result<()> {
        let Some(handle) = self.handle else {
            return Ok(());
        };

        try_execute!(self.backend.release_context(handle))?;
        self.handle = None;

        Ok(())
    }

    /// Returns `true` if the context is established and the resource manager still accepts it.
    ///
    /// Equivalent to `SCardIsValidContext`. An invalid handle is `false`, not an error.
    pub fn is_valid(&self) -> Result<bool> {
        let Some(handle) = self.handle else {
            return Ok(false);
        };

        try_execute!(self.backend.is_valid_context(handle), ErrorKind::InvalidHandle)
    }

    /// Cancels a blocking [Context::get_status_change] running on another thread.
    ///
    /// Equivalent to `SCardCancel`. The cancelled call fails with [ErrorKind::Cancelled].
    #[instrument(level = "debug", skip(self))]
    pub fn cancel(&self) -> Result<()> {
        let handle = self.raw_handle()?;

        try_execute!(self.backend.cancel(handle))
    }

    /// Lists the readers known to the resource manager, optionally restricted to reader groups.
    ///
    /// Equivalent to `SCardListReaders`. No readers is an empty list, not an error.
    #[instrument(level = "debug", skip(self))]
    pub fn list_readers(&self, groups: Option<&[&str]>) -> Result<Vec<String>> {
        let handle = self.raw_handle()?;

        let groups = groups.map(encode_groups).transpose()?;
        let groups = groups.as_deref();

        // https://pcsclite.apdu.fr/api/group__API.html#ga93b07815789b3cf2629d439ecf20f0d9
        //
        // If the application sends mszReaders as NULL then this function will return the size of the buffer needed
        // to allocate in pcchReaders.
        let mut readers_len: Dword = 0;
        if !try_execute!(
            self.backend.list_readers(handle, groups, None, &mut readers_len),
            ErrorKind::NoReadersAvailable
        )? {
            return Ok(Vec::new());
        }

        let len = platform::usize_len(readers_len);
        if len < MIN_READERS_LEN {
            debug!(len, "Reader list is too short to hold a reader");
            return Ok(Vec::new());
        }

        let mut readers = vec![0; len];
        if !try_execute!(
            self.backend
                .list_readers(handle, groups, Some(readers.as_mut_slice()), &mut readers_len),
            ErrorKind::NoReadersAvailable
        )? {
            return Ok(Vec::new());
        }
        readers.truncate(platform::usize_len(readers_len));

        let readers = multi_string::decode(&readers)?;
        debug!(?readers);

        Ok(readers)
    }

    /// Connects to the card in `reader`.
    ///
    /// Equivalent to `SCardConnect`. The preferred protocols are OR-ed together; an empty list means no protocol
    /// negotiation, as used with [ShareMode::Direct].
    #[instrument(level = "debug", skip(self))]
    pub fn connect(&self, reader: &str, share_mode: ShareMode, preferred_protocols: &[Protocol]) -> Result<Card> {
        let handle = self.raw_handle()?;
        let reader = CString::new(reader)?;
        let preferred_protocols = Protocol::mask(preferred_protocols)?;

        let mut card: ScardHandle = 0;
        let mut active_protocol: Dword = 0;
        try_execute!(self.backend.connect(
            handle,
            &reader,
            share_mode.into(),
            preferred_protocols,
            &mut card,
            &mut active_protocol,
        ))?;

        let protocol = Protocol::from_negotiated(active_protocol.to_u64());
        debug!(card = card.to_u64(), ?protocol, "Connected");

        Ok(Card::new(Arc::clone(&self.backend), card, protocol))
    }

    /// Waits until the state of one of the readers differs from its [ReaderState::current_state].
    ///
    /// Equivalent to `SCardGetStatusChange`. `None` waits forever. Returns one new state per input, in the same
    /// order. The wait can be interrupted with [Context::cancel] from another thread.
    #[instrument(level = "debug", skip(self, reader_states), fields(readers = reader_states.len()))]
    pub fn get_status_change(
        &self,
        timeout: Option<Duration>,
        reader_states: &[ReaderState],
    ) -> Result<Vec<ReaderState>> {
        let handle = self.raw_handle()?;

        // Reader names must stay alive until the native call returns.
        let names = reader_states
            .iter()
            .map(|state| CString::new(state.reader()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut native_states = reader_states
            .iter()
            .zip(&names)
            .map(|(state, name)| state.to_native(name))
            .collect::<Result<Vec<_>>>()?;

        try_execute!(self
            .backend
            .get_status_change(handle, timeout_millis(timeout), &mut native_states))?;

        Ok(reader_states
            .iter()
            .zip(&native_states)
            .map(|(state, native)| ReaderState::from_native(state.reader(), native))
            .collect())
    }

    /// Returns the current state of the readers without waiting.
    pub fn get_status(&self, reader_states: &[ReaderState]) -> Result<Vec<ReaderState>> {
        self.get_status_change(Some(Duration::ZERO), reader_states)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Err(error) = self.release() {
            warn!(%error, "Can not release the smart card context");
        }
    }
}

fn encode_groups(groups: &[&str]) -> Result<Vec<u8>> {
    if let Some(group) = groups.iter().find(|group| group.is_empty() || group.contains('\0')) {
        return Err(Error::precondition(format!("invalid reader group name: {:?}", group)));
    }

    Ok(multi_string::encode(groups))
}
