#[cfg(not(any(target_os = "windows", target_os = "macos")))]
use core::ffi::{c_long, c_ulong};

use crate::{LpCStr, LpVoid};

/// `DWORD` as seen by the native smart card library.
///
/// pcsc-lite on Linux uses `unsigned long`, so it is 8 bytes wide on 64-bit hosts.
#[cfg(any(target_os = "windows", target_os = "macos"))]
pub type Dword = u32;
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub type Dword = c_ulong;

/// Pointer to the [Dword].
pub type LpDword = *mut Dword;

/// `LONG` return value of every smart card function.
#[cfg(any(target_os = "windows", target_os = "macos"))]
pub type ScardStatus = i32;
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub type ScardStatus = c_long;

/// `hContext` returned by `SCardEstablishContext()`.
///
/// [SCARDCONTEXT](https://pcsclite.apdu.fr/api/pcsclite_8h.html#a22530ffaff18b5d3e32260a5f1ce4abd)
#[cfg(target_os = "windows")]
pub type ScardContext = usize;
#[cfg(target_os = "macos")]
pub type ScardContext = i32;
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub type ScardContext = c_long;

/// Pointer to the [ScardContext].
pub type LpScardContext = *mut ScardContext;

/// `hCard` returned by `SCardConnect()`.
///
/// [SCARDHANDLE](https://pcsclite.apdu.fr/api/pcsclite_8h.html#af328aca3e11de737ecd771bcf1f75fb5)
#[cfg(target_os = "windows")]
pub type ScardHandle = usize;
#[cfg(target_os = "macos")]
pub type ScardHandle = i32;
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub type ScardHandle = c_long;

/// Pointer to the [ScardHandle].
pub type LpScardHandle = *mut ScardHandle;

/// Capacity of the ATR buffer inside of the [ScardReaderState].
#[cfg(target_os = "windows")]
pub const MAX_ATR_SIZE: usize = 36;
/// Capacity of the ATR buffer inside of the [ScardReaderState].
#[cfg(not(target_os = "windows"))]
pub const MAX_ATR_SIZE: usize = 33;

/// [SCARD_IO_REQUEST](https://pcsclite.apdu.fr/api/structSCARD__IO__REQUEST.html)
///
/// Protocol Control Information (PCI).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(not(target_os = "macos"), repr(C))]
#[cfg_attr(target_os = "macos", repr(C, packed))]
pub struct ScardIoRequest {
    /// Protocol identifier.
    pub dw_protocol: Dword,
    /// Protocol Control Inf Length.
    pub cb_pci_length: Dword,
}

/// [SCARD_READERSTATE](https://pcsclite.apdu.fr/api/structSCARD__READERSTATE.html)
///
/// On Windows this is the ANSI `SCARD_READERSTATEA` structure.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(not(target_os = "macos"), repr(C))]
#[cfg_attr(target_os = "macos", repr(C, packed))]
pub struct ScardReaderState {
    /// Reader name.
    pub sz_reader: LpCStr,
    /// User defined data.
    pub pv_user_data: LpVoid,
    /// Current state of reader.
    pub dw_current_state: Dword,
    /// Reader state after a state change.
    pub dw_event_state: Dword,
    /// ATR Length.
    pub cb_atr: Dword,
    /// ATR.
    pub rgb_atr: [u8; MAX_ATR_SIZE],
}

impl Default for ScardReaderState {
    fn default() -> Self {
        Self {
            sz_reader: core::ptr::null(),
            pv_user_data: core::ptr::null_mut(),
            dw_current_state: 0,
            dw_event_state: 0,
            cb_atr: 0,
            rgb_atr: [0; MAX_ATR_SIZE],
        }
    }
}
