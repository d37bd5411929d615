//! Smart card function prototypes and their exported names.

use crate::{
    Dword, LpByte, LpCByte, LpCStr, LpCVoid, LpDword, LpScardContext, LpScardHandle, LpStr, LpVoid, ScardContext,
    ScardHandle, ScardIoRequest, ScardReaderState, ScardStatus,
};

/// Creates an Application Context to the PC/SC Resource Manager.
///
/// [SCardEstablishContext](https://pcsclite.apdu.fr/api/group__API.html#gaa1b8970169fd4883a6dc4a8f43f19b67)
/// Each thread of an application shall use its own `SCARDCONTEXT`, unless calling `SCardCancel()`,
/// which MUST be called with the same context as the context used to call `SCardGetStatusChange()`.
pub type SCardEstablishContextFn = unsafe extern "system" fn(
    dw_scope: Dword,
    pv_reserved1: LpCVoid,
    pv_reserved2: LpCVoid,
    ph_context: LpScardContext,
) -> ScardStatus;

/// Destroys a communication context to the PC/SC Resource Manager.
///
/// [SCardReleaseContext](https://pcsclite.apdu.fr/api/group__API.html#ga6aabcba7744c5c9419fdd6404f73a934)
pub type SCardReleaseContextFn = unsafe extern "system" fn(h_context: ScardContext) -> ScardStatus;

/// Check if a `SCARDCONTEXT` is valid.
///
/// [SCardIsValidContext](https://pcsclite.apdu.fr/api/group__API.html#ga722eb66bcc44d391f700ff9065cc080b)
pub type SCardIsValidContextFn = unsafe extern "system" fn(h_context: ScardContext) -> ScardStatus;

/// Cancels all pending blocking requests on the `SCardGetStatusChange()` function.
///
/// [SCardCancel](https://pcsclite.apdu.fr/api/group__API.html#gaacbbc0c6d6c0cbbeb4f4debf6fbeeee6)
pub type SCardCancelFn = unsafe extern "system" fn(h_context: ScardContext) -> ScardStatus;

/// Returns a list of currently available readers on the system.
///
/// [SCardListReaders](https://pcsclite.apdu.fr/api/group__API.html#ga93b07815789b3cf2629d439ecf20f0d9)
/// `mszReaders` is a multi-string. If it is null, the needed length is returned in `pcchReaders`.
pub type SCardListReadersFn = unsafe extern "system" fn(
    h_context: ScardContext,
    msz_groups: LpCStr,
    msz_readers: LpStr,
    pcch_readers: LpDword,
) -> ScardStatus;

/// Establishes a connection to the reader specified in `szReader`.
///
/// [SCardConnect](https://pcsclite.apdu.fr/api/group__API.html#ga4e515829752e0a8dbc4d630696a8d6a5)
pub type SCardConnectFn = unsafe extern "system" fn(
    h_context: ScardContext,
    sz_reader: LpCStr,
    dw_share_mode: Dword,
    dw_preferred_protocols: Dword,
    ph_card: LpScardHandle,
    pdw_active_protocol: LpDword,
) -> ScardStatus;

/// Reestablishes a connection to a reader that was previously connected to using `SCardConnect()`.
///
/// [SCardReconnect](https://pcsclite.apdu.fr/api/group__API.html#gad5d4393ca8c470112ad9468c44ed8940)
/// When another application resets the card in shared mode, `SCardReconnect()` must be called
/// in order to acknowledge that the card was reset.
pub type SCardReconnectFn = unsafe extern "system" fn(
    h_card: ScardHandle,
    dw_share_mode: Dword,
    dw_preferred_protocols: Dword,
    dw_initialization: Dword,
    pdw_active_protocol: LpDword,
) -> ScardStatus;

/// Terminates a connection made through `SCardConnect()`.
///
/// [SCardDisconnect](https://pcsclite.apdu.fr/api/group__API.html#ga4be198045c73ec0deb79e66c0ca1738a)
pub type SCardDisconnectFn = unsafe extern "system" fn(h_card: ScardHandle, dw_disposition: Dword) -> ScardStatus;

/// Establishes a temporary exclusive access mode for doing a series of commands in a transaction.
///
/// [SCardBeginTransaction](https://pcsclite.apdu.fr/api/group__API.html#gaddb835dce01a0da1d6ca02d33ee7d861)
pub type SCardBeginTransactionFn = unsafe extern "system" fn(h_card: ScardHandle) -> ScardStatus;

/// Ends a previously begun transaction.
///
/// [SCardEndTransaction](https://pcsclite.apdu.fr/api/group__API.html#gae8742473b404363e5c587f570d7e2f3b)
pub type SCardEndTransactionFn = unsafe extern "system" fn(h_card: ScardHandle, dw_disposition: Dword) -> ScardStatus;

/// Returns the current status of the reader connected to by `hCard`.
///
/// [SCardStatus](https://pcsclite.apdu.fr/api/group__API.html#gae49c3c894ad7ac12a5b896bde70d0382)
pub type SCardStatusFn = unsafe extern "system" fn(
    h_card: ScardHandle,
    msz_reader_names: LpStr,
    pcch_reader_len: LpDword,
    pdw_state: LpDword,
    pdw_protocol: LpDword,
    pb_atr: LpByte,
    pcb_atr_len: LpDword,
) -> ScardStatus;

/// Blocks execution until the current availability of the cards in a specific set of readers changes.
///
/// [SCardGetStatusChange](https://pcsclite.apdu.fr/api/group__API.html#ga33247d5d1257d59e55647c3bb717db24)
pub type SCardGetStatusChangeFn = unsafe extern "system" fn(
    h_context: ScardContext,
    dw_timeout: Dword,
    rg_reader_states: *mut ScardReaderState,
    c_readers: Dword,
) -> ScardStatus;

/// Sends an APDU to the smart card contained in the reader connected to by `SCardConnect()`.
///
/// [SCardTransmit](https://pcsclite.apdu.fr/api/group__API.html#ga9a2d77242a271310269065e64633ab99)
pub type SCardTransmitFn = unsafe extern "system" fn(
    h_card: ScardHandle,
    pio_send_pci: *const ScardIoRequest,
    pb_send_buffer: LpCByte,
    cb_send_length: Dword,
    pio_recv_pci: *mut ScardIoRequest,
    pb_recv_buffer: LpByte,
    pcb_recv_length: LpDword,
) -> ScardStatus;

/// Sends a command directly to the IFD Handler (reader driver) to be processed by the reader.
///
/// [SCardControl](https://pcsclite.apdu.fr/api/group__API.html#gac3454d4657110fd7f753b2d3d8f4e32f)
pub type SCardControlFn = unsafe extern "system" fn(
    h_card: ScardHandle,
    dw_control_code: Dword,
    pb_send_buffer: LpCVoid,
    cb_send_length: Dword,
    pb_recv_buffer: LpVoid,
    cb_recv_length: Dword,
    lp_bytes_returned: LpDword,
) -> ScardStatus;

/// Get an attribute from the IFD Handler (reader driver).
///
/// [SCardGetAttrib](https://pcsclite.apdu.fr/api/group__API.html#gaacfec51917255b7a25b94c5104961602)
/// If `pbAttr` is null, the needed length is returned in `pcbAttrLen`.
pub type SCardGetAttribFn =
    unsafe extern "system" fn(h_card: ScardHandle, dw_attr_id: Dword, pb_attr: LpByte, pcb_attr_len: LpDword) -> ScardStatus;

/// Every entry point and exported PCI block of the native smart card library.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
#[allow(non_snake_case)]
pub struct ScardApiFunctionTable {
    pub SCardEstablishContext: SCardEstablishContextFn,
    pub SCardReleaseContext: SCardReleaseContextFn,
    pub SCardIsValidContext: SCardIsValidContextFn,
    pub SCardCancel: SCardCancelFn,
    pub SCardListReaders: SCardListReadersFn,
    pub SCardConnect: SCardConnectFn,
    pub SCardReconnect: SCardReconnectFn,
    pub SCardDisconnect: SCardDisconnectFn,
    pub SCardBeginTransaction: SCardBeginTransactionFn,
    pub SCardEndTransaction: SCardEndTransactionFn,
    pub SCardStatus: SCardStatusFn,
    pub SCardGetStatusChange: SCardGetStatusChangeFn,
    pub SCardTransmit: SCardTransmitFn,
    pub SCardControl: SCardControlFn,
    pub SCardGetAttrib: SCardGetAttribFn,

    pub g_rgSCardT0Pci: *const ScardIoRequest,
    pub g_rgSCardT1Pci: *const ScardIoRequest,
    pub g_rgSCardRawPci: *const ScardIoRequest,
}

/// Exported symbol names.
///
/// WinSCard only exports the ANSI (`A`) and wide (`W`) variants of the functions that take strings.
/// macOS keeps the old `SCardControl` prototype under its name and exports the current one as `SCardControl132`.
pub mod symbols {
    pub const SCARD_ESTABLISH_CONTEXT: &str = "SCardEstablishContext";
    pub const SCARD_RELEASE_CONTEXT: &str = "SCardReleaseContext";
    pub const SCARD_IS_VALID_CONTEXT: &str = "SCardIsValidContext";
    pub const SCARD_CANCEL: &str = "SCardCancel";
    #[cfg(target_os = "windows")]
    pub const SCARD_LIST_READERS: &str = "SCardListReadersA";
    #[cfg(not(target_os = "windows"))]
    pub const SCARD_LIST_READERS: &str = "SCardListReaders";
    #[cfg(target_os = "windows")]
    pub const SCARD_CONNECT: &str = "SCardConnectA";
    #[cfg(not(target_os = "windows"))]
    pub const SCARD_CONNECT: &str = "SCardConnect";
    pub const SCARD_RECONNECT: &str = "SCardReconnect";
    pub const SCARD_DISCONNECT: &str = "SCardDisconnect";
    pub const SCARD_BEGIN_TRANSACTION: &str = "SCardBeginTransaction";
    pub const SCARD_END_TRANSACTION: &str = "SCardEndTransaction";
    #[cfg(target_os = "windows")]
    pub const SCARD_STATUS: &str = "SCardStatusA";
    #[cfg(not(target_os = "windows"))]
    pub const SCARD_STATUS: &str = "SCardStatus";
    #[cfg(target_os = "windows")]
    pub const SCARD_GET_STATUS_CHANGE: &str = "SCardGetStatusChangeA";
    #[cfg(not(target_os = "windows"))]
    pub const SCARD_GET_STATUS_CHANGE: &str = "SCardGetStatusChange";
    pub const SCARD_TRANSMIT: &str = "SCardTransmit";
    #[cfg(target_os = "macos")]
    pub const SCARD_CONTROL: &str = "SCardControl132";
    #[cfg(not(target_os = "macos"))]
    pub const SCARD_CONTROL: &str = "SCardControl";
    pub const SCARD_GET_ATTRIB: &str = "SCardGetAttrib";

    pub const SCARD_T0_PCI: &str = "g_rgSCardT0Pci";
    pub const SCARD_T1_PCI: &str = "g_rgSCardT1Pci";
    pub const SCARD_RAW_PCI: &str = "g_rgSCardRawPci";

    /// Library that is loaded when no path is configured.
    #[cfg(target_os = "windows")]
    pub const DEFAULT_LIBRARY: &str = "WinSCard.dll";
    /// Library that is loaded when no path is configured.
    #[cfg(target_os = "macos")]
    pub const DEFAULT_LIBRARY: &str = "/System/Library/Frameworks/PCSC.framework/PCSC";
    /// Library that is loaded when no path is configured.
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    pub const DEFAULT_LIBRARY: &str = "libpcsclite.so.1";
}
