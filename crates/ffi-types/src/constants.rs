//! Native constant values.
//!
//! Most values are shared by WinSCard and pcsc-lite. The ones that are not (raw protocol, card states)
//! are declared per target.

use crate::{Dword, ScardStatus};

/// No error was encountered.
pub const SCARD_S_SUCCESS: ScardStatus = 0;

/// Wait for the state change forever.
pub const SCARD_INFINITE: Dword = 0xffff_ffff;

pub const SCARD_SCOPE_USER: Dword = 0x0000;
pub const SCARD_SCOPE_TERMINAL: Dword = 0x0001;
pub const SCARD_SCOPE_SYSTEM: Dword = 0x0002;

pub const SCARD_SHARE_EXCLUSIVE: Dword = 0x0001;
pub const SCARD_SHARE_SHARED: Dword = 0x0002;
pub const SCARD_SHARE_DIRECT: Dword = 0x0003;

pub const SCARD_LEAVE_CARD: Dword = 0x0000;
pub const SCARD_RESET_CARD: Dword = 0x0001;
pub const SCARD_UNPOWER_CARD: Dword = 0x0002;
pub const SCARD_EJECT_CARD: Dword = 0x0003;

pub const SCARD_PROTOCOL_UNDEFINED: Dword = 0x0000;
pub const SCARD_PROTOCOL_T0: Dword = 0x0001;
pub const SCARD_PROTOCOL_T1: Dword = 0x0002;
#[cfg(target_os = "windows")]
pub const SCARD_PROTOCOL_RAW: Dword = 0x0001_0000;
#[cfg(not(target_os = "windows"))]
pub const SCARD_PROTOCOL_RAW: Dword = 0x0004;
/// T=15 protocol. WinSCard does not define it.
#[cfg(not(target_os = "windows"))]
pub const SCARD_PROTOCOL_T15: Dword = 0x0008;
pub const SCARD_PROTOCOL_ANY: Dword = SCARD_PROTOCOL_T0 | SCARD_PROTOCOL_T1;

pub const SCARD_STATE_UNAWARE: Dword = 0x0000;
pub const SCARD_STATE_IGNORE: Dword = 0x0001;
pub const SCARD_STATE_CHANGED: Dword = 0x0002;
pub const SCARD_STATE_UNKNOWN: Dword = 0x0004;
pub const SCARD_STATE_UNAVAILABLE: Dword = 0x0008;
pub const SCARD_STATE_EMPTY: Dword = 0x0010;
pub const SCARD_STATE_PRESENT: Dword = 0x0020;
pub const SCARD_STATE_ATRMATCH: Dword = 0x0040;
pub const SCARD_STATE_EXCLUSIVE: Dword = 0x0080;
pub const SCARD_STATE_INUSE: Dword = 0x0100;
pub const SCARD_STATE_MUTE: Dword = 0x0200;
pub const SCARD_STATE_UNPOWERED: Dword = 0x0400;

// > SCardStatus() returns a bit field on pcsc-lite but a enumeration on Windows.
//
// https://pcsclite.apdu.fr/api/group__API.html#differences
#[cfg(target_os = "windows")]
pub const SCARD_UNKNOWN: Dword = 0;
#[cfg(target_os = "windows")]
pub const SCARD_ABSENT: Dword = 1;
#[cfg(target_os = "windows")]
pub const SCARD_PRESENT: Dword = 2;
#[cfg(target_os = "windows")]
pub const SCARD_SWALLOWED: Dword = 3;
#[cfg(target_os = "windows")]
pub const SCARD_POWERED: Dword = 4;
#[cfg(target_os = "windows")]
pub const SCARD_NEGOTIABLE: Dword = 5;
#[cfg(target_os = "windows")]
pub const SCARD_SPECIFIC: Dword = 6;

#[cfg(not(target_os = "windows"))]
pub const SCARD_UNKNOWN: Dword = 0x0001;
#[cfg(not(target_os = "windows"))]
pub const SCARD_ABSENT: Dword = 0x0002;
#[cfg(not(target_os = "windows"))]
pub const SCARD_PRESENT: Dword = 0x0004;
#[cfg(not(target_os = "windows"))]
pub const SCARD_SWALLOWED: Dword = 0x0008;
#[cfg(not(target_os = "windows"))]
pub const SCARD_POWERED: Dword = 0x0010;
#[cfg(not(target_os = "windows"))]
pub const SCARD_NEGOTIABLE: Dword = 0x0020;
#[cfg(not(target_os = "windows"))]
pub const SCARD_SPECIFIC: Dword = 0x0040;
