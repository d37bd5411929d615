use std::sync::Arc;

use ffi_types::{Dword, ScardHandle};

use crate::attribute::AttributeId;
use crate::backend::{PcscBackend, Pci};
use crate::platform::{self, NativeWord, MAX_ATR_SIZE, MAX_BUFFER_SIZE};
use crate::{
    multi_string, CardState, CardStatus, Disposition, Error, ErrorKind, Initialization, Protocol, Result, ShareMode,
};

/// A connection to a smart card (`SCARDHANDLE`), created by [crate::Context::connect].
///
/// Once disconnected, every operation fails with [Error::Precondition]. Dropping a connected card disconnects it
/// with [Disposition::Leave]. A failed disconnect in `Drop`, which happens for example when the card outlives its
/// [crate::Context] and the library already dropped the handle, is logged with `warn!` and otherwise ignored.
#[derive(Debug)]
pub struct Card {
    backend: Arc<dyn PcscBackend>,
    handle: Option<ScardHandle>,
    protocol: Option<Protocol>,
}

impl Card {
    pub(crate) fn new(backend: Arc<dyn PcscBackend>, handle: ScardHandle, protocol: Option<Protocol>) -> Self {
        Self {
            backend,
            handle: Some(handle),
            protocol,
        }
    }

    /// Protocol negotiated by the last connect or reconnect. `None` when nothing was negotiated or after
    /// disconnect.
    pub fn protocol(&self) -> Option<Protocol> {
        self.protocol
    }

    /// Native handle widened to 64 bits, `None` once disconnected.
    pub fn handle(&self) -> Option<u64> {
        self.handle.map(NativeWord::to_u64)
    }

    fn raw_handle(&self) -> Result<ScardHandle> {
        self.handle
            .ok_or_else(|| Error::precondition("the card is already disconnected"))
    }

    /// Sends an APDU and returns the card response, status word included.
    ///
    /// Equivalent to `SCardTransmit` with the PCI of the active protocol. Responses are limited to
    /// [MAX_BUFFER_SIZE] bytes.
    #[instrument(level = "debug", skip(self, apdu), fields(apdu_len = apdu.len()))]
    pub fn transmit(&self, apdu: &[u8]) -> Result<Vec<u8>> {
        let handle = self.raw_handle()?;

        let pci = match self.protocol {
            Some(Protocol::T0) => Pci::T0,
            Some(Protocol::T1) => Pci::T1,
            Some(Protocol::Raw) => Pci::Raw,
            protocol => {
                return Err(Error::NotImplemented(format!(
                    "transmission over {:?} protocol",
                    protocol
                )))
            }
        };

        let mut response = vec![0; MAX_BUFFER_SIZE];
        let mut response_len = platform::dword_len(response.len())?;
        try_execute!(self
            .backend
            .transmit(handle, pci, apdu, &mut response, &mut response_len))?;
        response.truncate(platform::usize_len(response_len));
        debug!(response_len = response.len());

        Ok(response)
    }

    /// Re-establishes the connection, for example after another application reset the card.
    ///
    /// Equivalent to `SCardReconnect`. Returns the newly negotiated protocol, which also becomes
    /// [Card::protocol].
    #[instrument(level = "debug", skip(self))]
    pub fn reconnect(
        &mut self,
        share_mode: ShareMode,
        preferred_protocols: &[Protocol],
        initialization: Initialization,
    ) -> Result<Option<Protocol>> {
        let handle = self.raw_handle()?;
        let preferred_protocols = Protocol::mask(preferred_protocols)?;

        let mut active_protocol: Dword = 0;
        try_execute!(self.backend.reconnect(
            handle,
            share_mode.into(),
            preferred_protocols,
            initialization.into(),
            &mut active_protocol,
        ))?;

        self.protocol = Protocol::from_negotiated(active_protocol.to_u64());
        debug!(protocol = ?self.protocol, "Reconnected");

        Ok(self.protocol)
    }

    /// Terminates the connection. Disconnecting a disconnected card does nothing.
    ///
    /// Equivalent to `SCardDisconnect`. If the native call fails, the card stays connected.
    #[instrument(level = "debug", skip(self))]
    pub fn disconnect(&mut self, disposition: Disposition) -> Result<()> {
        let Some(handle) = self.handle else {
            return Ok(());
        };

        try_execute!(self.backend.disconnect(handle, disposition.into()))?;
        self.handle = None;
        self.protocol = None;

        Ok(())
    }

    /// Gains exclusive access to the card, waiting for other applications to end their transactions.
    ///
    /// Equivalent to `SCardBeginTransaction`.
    pub fn begin_transaction(&self) -> Result<()> {
        let handle = self.raw_handle()?;

        try_execute!(self.backend.begin_transaction(handle))
    }

    /// Ends a transaction started with [Card::begin_transaction].
    ///
    /// Equivalent to `SCardEndTransaction`.
    pub fn end_transaction(&self, disposition: Disposition) -> Result<()> {
        let handle = self.raw_handle()?;

        try_execute!(self.backend.end_transaction(handle, disposition.into()))
    }

    /// Current status of the reader and the card.
    ///
    /// Equivalent to `SCardStatus`.
    #[instrument(level = "debug", skip(self), ret)]
    pub fn status(&self) -> Result<CardStatus> {
        let handle = self.raw_handle()?;

        let mut names_len: Dword = 0;
        let mut atr_len: Dword = 0;
        let mut state: Dword = 0;
        let mut protocol: Dword = 0;

        // Some implementations report the required lengths together with SCARD_E_INSUFFICIENT_BUFFER.
        if let Err(error) = try_execute!(self.backend.status(
            handle,
            None,
            &mut names_len,
            &mut state,
            &mut protocol,
            None,
            &mut atr_len,
        )) {
            if error.kind() != Some(ErrorKind::InsufficientBuffer) {
                return Err(error);
            }
        }

        let mut names = vec![0; platform::usize_len(names_len)];
        let mut atr = vec![0; platform::usize_len(atr_len).max(MAX_ATR_SIZE)];
        atr_len = platform::dword_len(atr.len())?;

        try_execute!(self.backend.status(
            handle,
            (!names.is_empty()).then_some(names.as_mut_slice()),
            &mut names_len,
            &mut state,
            &mut protocol,
            Some(atr.as_mut_slice()),
            &mut atr_len,
        ))?;

        names.truncate(platform::usize_len(names_len));
        atr.truncate(platform::usize_len(atr_len));

        Ok(CardStatus {
            reader_names: multi_string::decode(&names)?,
            state: CardState::from_native(state.to_u64()),
            protocol: Protocol::from_negotiated(protocol.to_u64()),
            atr,
        })
    }

    /// Sends a command directly to the reader.
    ///
    /// Equivalent to `SCardControl`. `code` is usually built with [crate::ctl_code]. A `receive_buffer_size` of zero
    /// passes no receive buffer and returns `None`; otherwise the returned bytes are at most that long.
    #[instrument(level = "debug", skip(self, send), fields(send_len = ?send.map(<[u8]>::len)))]
    pub fn control(&self, code: u64, send: Option<&[u8]>, receive_buffer_size: usize) -> Result<Option<Vec<u8>>> {
        let handle = self.raw_handle()?;
        let code = platform::dword(code, "control code")?;

        let mut received = (receive_buffer_size > 0).then(|| vec![0; receive_buffer_size]);
        let mut received_len: Dword = 0;
        try_execute!(self
            .backend
            .control(handle, code, send, received.as_deref_mut(), &mut received_len))?;

        Ok(received.map(|mut received| {
            received.truncate(platform::usize_len(received_len));
            received
        }))
    }

    /// Reads a reader attribute.
    ///
    /// Equivalent to `SCardGetAttrib`. `None` if the reader does not support the attribute.
    pub fn get_attrib(&self, attribute: impl Into<AttributeId>) -> Result<Option<Vec<u8>>> {
        let handle = self.raw_handle()?;
        let attribute = attribute.into();
        debug!(?attribute, "Reading reader attribute");
        let attr_id = platform::dword(attribute.value(), "attribute id")?;

        let mut attr_len: Dword = 0;
        match try_execute!(self.backend.get_attrib(handle, attr_id, None, &mut attr_len)) {
            Ok(()) => {}
            Err(error) if matches!(error.kind(), Some(ErrorKind::Unexpected | ErrorKind::UnsupportedFeature)) => {
                debug!(%error, "Attribute is not supported");
                return Ok(None);
            }
            Err(error) => return Err(error),
        }

        let len = platform::usize_len(attr_len);
        if len == 0 {
            return Ok(Some(Vec::new()));
        }

        let mut attr = vec![0; len];
        try_execute!(self
            .backend
            .get_attrib(handle, attr_id, Some(attr.as_mut_slice()), &mut attr_len))?;
        attr.truncate(platform::usize_len(attr_len));

        Ok(Some(attr))
    }
}

impl Drop for Card {
    fn drop(&mut self) {
        if let Err(error) = self.disconnect(Disposition::Leave) {
            warn!(%error, "Can not disconnect from the card");
        }
    }
}
