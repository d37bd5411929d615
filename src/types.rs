use std::time::Duration;

use ffi_types::constants::*;
use ffi_types::Dword;

use crate::platform::NativeWord;
use crate::{Error, Result};

/// Timeout that is long enough to be considered indefinite, but still a finite value (50 days).
pub const LONG_TIMEOUT: Duration = Duration::from_secs(50 * 24 * 60 * 60);

/// Scope of the resource manager context.
///
/// [SCardEstablishContext](https://learn.microsoft.com/en-us/windows/win32/api/winscard/nf-winscard-scardestablishcontext)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Database operations are performed within the domain of the user.
    #[default]
    User,
    /// Database operations are performed within the domain of the terminal. Reserved for future use.
    Terminal,
    /// Database operations are performed within the domain of the system.
    System,
}

impl From<Scope> for Dword {
    fn from(value: Scope) -> Self {
        match value {
            Scope::User => SCARD_SCOPE_USER,
            Scope::Terminal => SCARD_SCOPE_TERMINAL,
            Scope::System => SCARD_SCOPE_SYSTEM,
        }
    }
}

/// A flag that indicates whether other applications may form connections to the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareMode {
    /// This application demands total control of the reader, so it is not available to other applications.
    Exclusive,
    /// This application will allow others to share the reader.
    Shared,
    /// Direct connection to the reader. A card does not have to be present.
    Direct,
}

impl From<ShareMode> for Dword {
    fn from(value: ShareMode) -> Self {
        match value {
            ShareMode::Exclusive => SCARD_SHARE_EXCLUSIVE,
            ShareMode::Shared => SCARD_SHARE_SHARED,
            ShareMode::Direct => SCARD_SHARE_DIRECT,
        }
    }
}

/// Communication protocol.
///
/// "No protocol" (undefined or unrecognized) is represented as `None` wherever a protocol is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// T=0 protocol.
    T0,
    /// T=1 protocol.
    T1,
    /// T=15 protocol. pcsc-lite only.
    T15,
    /// Raw (memory card) protocol.
    Raw,
    /// T=0 or T=1, whatever the card supports.
    Any,
}

impl Protocol {
    /// Native bit mask of this protocol. `None` if the host library does not know it.
    pub fn native_bits(self) -> Option<Dword> {
        match self {
            Protocol::T0 => Some(SCARD_PROTOCOL_T0),
            Protocol::T1 => Some(SCARD_PROTOCOL_T1),
            #[cfg(not(target_os = "windows"))]
            Protocol::T15 => Some(SCARD_PROTOCOL_T15),
            #[cfg(target_os = "windows")]
            Protocol::T15 => None,
            Protocol::Raw => Some(SCARD_PROTOCOL_RAW),
            Protocol::Any => Some(SCARD_PROTOCOL_ANY),
        }
    }

    /// OR-s the preferred protocols together. An empty set is `0`: no preference, which is what
    /// [ShareMode::Direct] expects.
    pub fn mask(protocols: &[Protocol]) -> Result<Dword> {
        protocols.iter().try_fold(SCARD_PROTOCOL_UNDEFINED, |mask, protocol| {
            protocol
                .native_bits()
                .map(|bits| mask | bits)
                .ok_or_else(|| Error::NotImplemented(format!("{:?} is not supported by the native library", protocol)))
        })
    }

    /// Decodes the protocol reported by connect, reconnect or status.
    ///
    /// Only a single concrete protocol is recognized. Zero, combined masks and unknown bits are `None`.
    pub fn from_negotiated(value: u64) -> Option<Protocol> {
        [Protocol::T0, Protocol::T1, Protocol::T15, Protocol::Raw]
            .into_iter()
            .find(|protocol| protocol.native_bits().map(NativeWord::to_u64) == Some(value))
    }
}

/// Action to take on the card in the connected reader on close.
///
/// [SCardDisconnect](https://learn.microsoft.com/en-us/windows/win32/api/winscard/nf-winscard-scarddisconnect)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Disposition {
    /// Do not do anything special.
    #[default]
    Leave,
    /// Reset the card.
    Reset,
    /// Power down the card.
    Unpower,
    /// Eject the card. Not every reader can do it.
    Eject,
}

impl From<Disposition> for Dword {
    fn from(value: Disposition) -> Self {
        match value {
            Disposition::Leave => SCARD_LEAVE_CARD,
            Disposition::Reset => SCARD_RESET_CARD,
            Disposition::Unpower => SCARD_UNPOWER_CARD,
            Disposition::Eject => SCARD_EJECT_CARD,
        }
    }
}

/// Type of initialization that should be performed on the card during reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Initialization {
    /// Do not do anything special on reconnect.
    #[default]
    Leave,
    /// Reset the card (warm reset).
    Reset,
    /// Power down the card and reset it (cold reset).
    Unpower,
}

impl From<Initialization> for Dword {
    fn from(value: Initialization) -> Self {
        match value {
            Initialization::Leave => SCARD_LEAVE_CARD,
            Initialization::Reset => SCARD_RESET_CARD,
            Initialization::Unpower => SCARD_UNPOWER_CARD,
        }
    }
}

/// Builds a reader control code for [crate::Card::control] (`SCARD_CTL_CODE`).
///
/// WinSCard and pcsc-lite use different formulas for the same function number.
pub fn ctl_code(function: u32) -> u64 {
    if cfg!(target_os = "windows") {
        // FILE_DEVICE_SMARTCARD << 16 | METHOD_BUFFERED | FILE_ANY_ACCESS
        (0x31 << 16) | (u64::from(function) << 2)
    } else {
        0x4200_0000 + u64::from(function)
    }
}

/// Native timeout in milliseconds. `None` waits forever.
pub(crate) fn timeout_millis(timeout: Option<Duration>) -> Dword {
    match timeout {
        Some(timeout) => u64::try_from(timeout.as_millis())
            .ok()
            .filter(|millis| *millis < SCARD_INFINITE.to_u64())
            .and_then(Dword::from_u64)
            .unwrap_or(SCARD_INFINITE - 1),
        None => SCARD_INFINITE,
    }
}
