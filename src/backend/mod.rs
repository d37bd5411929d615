//! Native smart card entry points behind one interface.
//!
//! [PcscBackend] mirrors the PC/SC primitives one to one, in native types, with pointers replaced by slices and
//! references. [crate::Context] and [crate::Card] do every conversion and length negotiation on top of it, so a
//! backend stays a thin shim.

mod system;

use std::ffi::CStr;
use std::fmt;
use std::sync::{Arc, OnceLock};

use ffi_types::{Dword, ScardContext, ScardHandle, ScardReaderState, ScardStatus};

pub use self::system::SystemBackend;
use crate::Result;

/// Protocol Control Information block sent with [PcscBackend::transmit].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pci {
    /// `SCARD_PCI_T0`.
    T0,
    /// `SCARD_PCI_T1`.
    T1,
    /// `SCARD_PCI_RAW`.
    Raw,
}

/// Native PC/SC primitives.
///
/// In/out length parameters behave like the native ones: on input they hold the buffer capacity (clamped to the
/// slice length by the implementation), on output the length the library reports. A `None` buffer asks for the
/// required length only.
pub trait PcscBackend: fmt::Debug + Send + Sync {
    /// [SCardEstablishContext](https://pcsclite.apdu.fr/api/group__API.html#gaa1b8970169fd4883a6dc4a8f43f19b67)
    fn establish_context(&self, scope: Dword, context: &mut ScardContext) -> ScardStatus;

    /// [SCardReleaseContext](https://pcsclite.apdu.fr/api/group__API.html#ga6aabcba7744c5c9419fdd6404f73a934)
    fn release_context(&self, context: ScardContext) -> ScardStatus;

    /// [SCardIsValidContext](https://pcsclite.apdu.fr/api/group__API.html#ga722eb66bcc44d391f700ff9065cc080b)
    fn is_valid_context(&self, context: ScardContext) -> ScardStatus;

    /// [SCardCancel](https://pcsclite.apdu.fr/api/group__API.html#gaacbbc0c6d6c0cbbeb4f4debf6fbeeee6)
    ///
    /// Called from another thread while [PcscBackend::get_status_change] blocks on the same context.
    fn cancel(&self, context: ScardContext) -> ScardStatus;

    /// [SCardListReaders](https://pcsclite.apdu.fr/api/group__API.html#ga93b07815789b3cf2629d439ecf20f0d9)
    fn list_readers(
        &self,
        context: ScardContext,
        groups: Option<&[u8]>,
        readers: Option<&mut [u8]>,
        readers_len: &mut Dword,
    ) -> ScardStatus;

    /// [SCardConnect](https://pcsclite.apdu.fr/api/group__API.html#ga4e515829752e0a8dbc4d630696a8d6a5)
    fn connect(
        &self,
        context: ScardContext,
        reader: &CStr,
        share_mode: Dword,
        preferred_protocols: Dword,
        card: &mut ScardHandle,
        active_protocol: &mut Dword,
    ) -> ScardStatus;

    /// [SCardReconnect](https://pcsclite.apdu.fr/api/group__API.html#gad5d4393ca8c470112ad9468c44ed8940)
    fn reconnect(
        &self,
        card: ScardHandle,
        share_mode: Dword,
        preferred_protocols: Dword,
        initialization: Dword,
        active_protocol: &mut Dword,
    ) -> ScardStatus;

    /// [SCardDisconnect](https://pcsclite.apdu.fr/api/group__API.html#ga4be198045c73ec0deb79e66c0ca1738a)
    fn disconnect(&self, card: ScardHandle, disposition: Dword) -> ScardStatus;

    /// [SCardBeginTransaction](https://pcsclite.apdu.fr/api/group__API.html#gaddb835dce01a0da1d6ca02d33ee7d861)
    fn begin_transaction(&self, card: ScardHandle) -> ScardStatus;

    /// [SCardEndTransaction](https://pcsclite.apdu.fr/api/group__API.html#gae8742473b404363e5c587f570d7e2f3b)
    fn end_transaction(&self, card: ScardHandle, disposition: Dword) -> ScardStatus;

    /// [SCardStatus](https://pcsclite.apdu.fr/api/group__API.html#gae49c3c894ad7ac12a5b896bde70d0382)
    #[allow(clippy::too_many_arguments)]
    fn status(
        &self,
        card: ScardHandle,
        reader_names: Option<&mut [u8]>,
        reader_names_len: &mut Dword,
        state: &mut Dword,
        protocol: &mut Dword,
        atr: Option<&mut [u8]>,
        atr_len: &mut Dword,
    ) -> ScardStatus;

    /// [SCardGetStatusChange](https://pcsclite.apdu.fr/api/group__API.html#ga33247d5d1257d59e55647c3bb717db24)
    ///
    /// The reader name pointers of `reader_states` stay valid for the duration of the call.
    fn get_status_change(
        &self,
        context: ScardContext,
        timeout: Dword,
        reader_states: &mut [ScardReaderState],
    ) -> ScardStatus;

    /// [SCardTransmit](https://pcsclite.apdu.fr/api/group__API.html#ga9a2d77242a271310269065e64633ab99)
    fn transmit(
        &self,
        card: ScardHandle,
        pci: Pci,
        send: &[u8],
        recv: &mut [u8],
        recv_len: &mut Dword,
    ) -> ScardStatus;

    /// [SCardControl](https://pcsclite.apdu.fr/api/group__API.html#gac3454d4657110fd7f753b2d3d8f4e32f)
    fn control(
        &self,
        card: ScardHandle,
        control_code: Dword,
        send: Option<&[u8]>,
        recv: Option<&mut [u8]>,
        bytes_returned: &mut Dword,
    ) -> ScardStatus;

    /// [SCardGetAttrib](https://pcsclite.apdu.fr/api/group__API.html#gaacfec51917255b7a25b94c5104961602)
    fn get_attrib(
        &self,
        card: ScardHandle,
        attr_id: Dword,
        attr: Option<&mut [u8]>,
        attr_len: &mut Dword,
    ) -> ScardStatus;
}

static SYSTEM_BACKEND: OnceLock<Result<Arc<SystemBackend>>> = OnceLock::new();

/// Returns the process-wide [SystemBackend], loading the native library on first use.
///
/// Does not touch the global `tracing` dispatcher, call [crate::logging::setup_logger] to opt in to file logging.
/// The library is never unloaded: handles obtained from it stay usable until they are released. A failed load is remembered and later calls return the same error.
pub fn system() -> Result<Arc<dyn PcscBackend>> {
    SYSTEM_BACKEND
        .get_or_init(|| SystemBackend::load().map(Arc::new))
        .clone()
        .map(|backend| backend as Arc<dyn PcscBackend>)
}
