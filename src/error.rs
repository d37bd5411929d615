use std::{fmt, result};

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// The [Result] type used across the crate.
pub type Result<T> = result::Result<T, Error>;

/// Represents a general smart card error.
///
/// The variants are disjoint: a [Error::Scard] always comes from the native library, every other variant is raised
/// locally before or after the native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The native library returned a non-success status code.
    Scard(ScardError),
    /// The API was used in a way that can not succeed: the handle is already released, an argument is out of range,
    /// a string contains an interior NUL byte.
    Precondition(String),
    /// The requested behavior is not implemented for the current state (e.g. transmit over an unsupported protocol).
    NotImplemented(String),
    /// The native smart card library can not be loaded.
    Library(String),
    /// The native library returned data that can not be decoded.
    InvalidData(String),
}

impl Error {
    /// Creates a new [Error::Precondition].
    pub fn precondition(description: impl Into<String>) -> Self {
        Error::Precondition(description.into())
    }

    /// Returns the classified [ErrorKind] if this is a protocol error with a known code.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Scard(error) => error.kind(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Scard(error) => write!(f, "PC/SC error: {error}"),
            Error::Precondition(description) => write!(f, "precondition violated: {description}"),
            Error::NotImplemented(description) => write!(f, "not implemented: {description}"),
            Error::Library(description) => write!(f, "native library error: {description}"),
            Error::InvalidData(description) => write!(f, "invalid data: {description}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Scard(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ScardError> for Error {
    fn from(value: ScardError) -> Self {
        Error::Scard(value)
    }
}

impl From<ErrorKind> for Error {
    fn from(value: ErrorKind) -> Self {
        Error::Scard(ScardError::from(value))
    }
}

impl From<std::ffi::NulError> for Error {
    fn from(value: std::ffi::NulError) -> Self {
        Error::Precondition(format!("string contains an interior NUL byte: {}", value))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(value: std::str::Utf8Error) -> Self {
        Error::InvalidData(format!("string is not valid UTF-8: {}", value))
    }
}

/// A non-success status code returned by a native smart card function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScardError {
    code: u64,
}

impl ScardError {
    /// Creates a new [ScardError] from the raw (already widened) status code.
    pub fn new(code: u64) -> Self {
        Self { code }
    }

    /// Raw status code.
    pub fn code(&self) -> u64 {
        self.code
    }

    /// Looks the code up in the [ErrorKind] table.
    pub fn kind(&self) -> Option<ErrorKind> {
        ErrorKind::classify(self.code)
    }
}

impl From<ErrorKind> for ScardError {
    fn from(value: ErrorKind) -> Self {
        Self::new(u64::from(u32::from(value)))
    }
}

impl fmt::Display for ScardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{} ({:#x}): {}", kind.name(), self.code, kind.description()),
            None => write!(f, "UNKNOWN ({:#x})", self.code),
        }
    }
}

impl std::error::Error for ScardError {}

/// [Smart Card Return Values](https://learn.microsoft.com/en-us/windows/win32/secauthn/authentication-return-values).
///
/// pcsc-lite aliases `SCARD_E_UNSUPPORTED_FEATURE` to `SCARD_E_UNEXPECTED` (`0x8010001F`). Here every code maps to
/// exactly one variant, so `0x8010001F` is always [ErrorKind::Unexpected] and [ErrorKind::UnsupportedFeature]
/// keeps its WinSCard value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ToPrimitive, FromPrimitive)]
#[repr(u32)]
pub enum ErrorKind {
    /// No error was encountered.
    Success = 0,
    /// An internal consistency check failed.
    InternalError = 0x80100001,
    /// The action was cancelled by an SCardCancel request.
    Cancelled = 0x80100002,
    /// The supplied handle was not valid.
    InvalidHandle = 0x80100003,
    /// One or more of the supplied parameters could not be properly interpreted.
    InvalidParameter = 0x80100004,
    /// Registry startup information is missing or not valid.
    InvalidTarget = 0x80100005,
    /// Not enough memory available to complete this command.
    NoMemory = 0x80100006,
    /// An internal consistency timer has expired.
    WaitedTooLong = 0x80100007,
    /// The data buffer for returned data is too small for the returned data.
    InsufficientBuffer = 0x80100008,
    /// The specified reader name is not recognized.
    UnknownReader = 0x80100009,
    /// The user-specified time-out value has expired.
    Timeout = 0x8010000A,
    /// The smart card cannot be accessed because of other outstanding connections.
    SharingViolation = 0x8010000B,
    /// The operation requires a smart card, but no smart card is currently in the device.
    NoSmartCard = 0x8010000C,
    /// The specified smart card name is not recognized.
    UnknownCard = 0x8010000D,
    /// The system could not dispose of the media in the requested manner.
    CantDispose = 0x8010000E,
    /// The requested protocols are incompatible with the protocol currently in use with the card.
    ProtoMismatch = 0x8010000F,
    /// The reader or card is not ready to accept commands.
    NotReady = 0x80100010,
    /// One or more of the supplied parameter values could not be properly interpreted.
    InvalidValue = 0x80100011,
    /// The action was cancelled by the system, presumably to log off or shut down.
    SystemCancelled = 0x80100012,
    /// An internal communications error has been detected.
    CommError = 0x80100013,
    /// An internal error has been detected, but the source is unknown.
    UnknownError = 0x80100014,
    /// An ATR string obtained from the registry is not a valid ATR string.
    InvalidAtr = 0x80100015,
    /// An attempt was made to end a nonexistent transaction.
    NotTransacted = 0x80100016,
    /// The specified reader is not currently available for use.
    ReaderUnavailable = 0x80100017,
    /// The operation has been aborted to allow the server application to exit.
    Shutdown = 0x80100018,
    /// The PCI receive buffer was too small.
    PciTooSmall = 0x80100019,
    /// The reader driver does not meet minimal requirements for support.
    ReaderUnsupported = 0x8010001A,
    /// The reader driver did not produce a unique reader name.
    DuplicateReader = 0x8010001B,
    /// The smart card does not meet minimal requirements for support.
    CardUnsupported = 0x8010001C,
    /// The smart card resource manager is not running.
    NoService = 0x8010001D,
    /// The smart card resource manager has shut down.
    ServiceStopped = 0x8010001E,
    /// An unexpected card error has occurred.
    Unexpected = 0x8010001F,
    /// No primary provider can be found for the smart card.
    IccInstallation = 0x80100020,
    /// The requested order of object creation is not supported.
    IccCreateOrder = 0x80100021,
    /// This smart card does not support the requested feature.
    UnsupportedFeature = 0x80100022,
    /// The specified directory does not exist in the smart card.
    DirNotFound = 0x80100023,
    /// The specified file does not exist in the smart card.
    FileNotFound = 0x80100024,
    /// The supplied path does not represent a smart card directory.
    NoDir = 0x80100025,
    /// The supplied path does not represent a smart card file.
    NoFile = 0x80100026,
    /// Access is denied to the file.
    NoAccess = 0x80100027,
    /// An attempt was made to write more data than would fit in the target object.
    WriteTooMany = 0x80100028,
    /// An error occurred in setting the smart card file object pointer.
    BadSeek = 0x80100029,
    /// The supplied PIN is incorrect.
    InvalidChv = 0x8010002A,
    /// An unrecognized error code was returned from a layered component.
    UnknownResMng = 0x8010002B,
    /// The requested certificate does not exist.
    NoSuchCertificate = 0x8010002C,
    /// The requested certificate could not be obtained.
    CertificateUnavailable = 0x8010002D,
    /// No smart card reader is available.
    NoReadersAvailable = 0x8010002E,
    /// A communications error with the smart card has been detected.
    CommDataLost = 0x8010002F,
    /// The requested key container does not exist on the smart card.
    NoKeyContainer = 0x80100030,
    /// The smart card resource manager is too busy to complete this operation.
    ServerTooBusy = 0x80100031,
    /// The smart card PIN cache has expired.
    PinCacheExpired = 0x80100032,
    /// The smart card PIN cannot be cached.
    NoPinCache = 0x80100033,
    /// The smart card is read-only and cannot be written to.
    ReadOnlyCard = 0x80100034,
    /// The reader cannot communicate with the card, due to ATR string configuration conflicts.
    UnsupportedCard = 0x80100065,
    /// The smart card is not responding to a reset.
    UnresponsiveCard = 0x80100066,
    /// Power has been removed from the smart card, so that further communication is not possible.
    UnpoweredCard = 0x80100067,
    /// The smart card was reset.
    ResetCard = 0x80100068,
    /// The smart card has been removed, so further communication is not possible.
    RemovedCard = 0x80100069,
    /// Access was denied because of a security violation.
    SecurityViolation = 0x8010006A,
    /// The card cannot be accessed because the wrong PIN was presented.
    WrongChv = 0x8010006B,
    /// The card cannot be accessed because the maximum number of PIN entry attempts has been reached.
    ChvBlocked = 0x8010006C,
    /// The end of the smart card file has been reached.
    Eof = 0x8010006D,
    /// The action was cancelled by the user.
    CancelledByUser = 0x8010006E,
    /// No PIN was presented to the smart card.
    CardNotAuthenticated = 0x8010006F,
}

impl ErrorKind {
    /// Every table entry, in code order.
    pub const ALL: [ErrorKind; 64] = [
        ErrorKind::Success,
        ErrorKind::InternalError,
        ErrorKind::Cancelled,
        ErrorKind::InvalidHandle,
        ErrorKind::InvalidParameter,
        ErrorKind::InvalidTarget,
        ErrorKind::NoMemory,
        ErrorKind::WaitedTooLong,
        ErrorKind::InsufficientBuffer,
        ErrorKind::UnknownReader,
        ErrorKind::Timeout,
        ErrorKind::SharingViolation,
        ErrorKind::NoSmartCard,
        ErrorKind::UnknownCard,
        ErrorKind::CantDispose,
        ErrorKind::ProtoMismatch,
        ErrorKind::NotReady,
        ErrorKind::InvalidValue,
        ErrorKind::SystemCancelled,
        ErrorKind::CommError,
        ErrorKind::UnknownError,
        ErrorKind::InvalidAtr,
        ErrorKind::NotTransacted,
        ErrorKind::ReaderUnavailable,
        ErrorKind::Shutdown,
        ErrorKind::PciTooSmall,
        ErrorKind::ReaderUnsupported,
        ErrorKind::DuplicateReader,
        ErrorKind::CardUnsupported,
        ErrorKind::NoService,
        ErrorKind::ServiceStopped,
        ErrorKind::Unexpected,
        ErrorKind::IccInstallation,
        ErrorKind::IccCreateOrder,
        ErrorKind::UnsupportedFeature,
        ErrorKind::DirNotFound,
        ErrorKind::FileNotFound,
        ErrorKind::NoDir,
        ErrorKind::NoFile,
        ErrorKind::NoAccess,
        ErrorKind::WriteTooMany,
        ErrorKind::BadSeek,
        ErrorKind::InvalidChv,
        ErrorKind::UnknownResMng,
        ErrorKind::NoSuchCertificate,
        ErrorKind::CertificateUnavailable,
        ErrorKind::NoReadersAvailable,
        ErrorKind::CommDataLost,
        ErrorKind::NoKeyContainer,
        ErrorKind::ServerTooBusy,
        ErrorKind::PinCacheExpired,
        ErrorKind::NoPinCache,
        ErrorKind::ReadOnlyCard,
        ErrorKind::UnsupportedCard,
        ErrorKind::UnresponsiveCard,
        ErrorKind::UnpoweredCard,
        ErrorKind::ResetCard,
        ErrorKind::RemovedCard,
        ErrorKind::SecurityViolation,
        ErrorKind::WrongChv,
        ErrorKind::ChvBlocked,
        ErrorKind::Eof,
        ErrorKind::CancelledByUser,
        ErrorKind::CardNotAuthenticated,
    ];

    /// Exact lookup of a widened status code. Codes above `u32::MAX` are never valid.
    pub fn classify(code: u64) -> Option<Self> {
        u32::try_from(code).ok().and_then(ErrorKind::from_u32)
    }

    /// Canonical short name, as found in `winscard.h` and `pcsclite.h`.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Success => "SCARD_S_SUCCESS",
            ErrorKind::InternalError => "SCARD_F_INTERNAL_ERROR",
            ErrorKind::Cancelled => "SCARD_E_CANCELLED",
            ErrorKind::InvalidHandle => "SCARD_E_INVALID_HANDLE",
            ErrorKind::InvalidParameter => "SCARD_E_INVALID_PARAMETER",
            ErrorKind::InvalidTarget => "SCARD_E_INVALID_TARGET",
            ErrorKind::NoMemory => "SCARD_E_NO_MEMORY",
            ErrorKind::WaitedTooLong => "SCARD_F_WAITED_TOO_LONG",
            ErrorKind::InsufficientBuffer => "SCARD_E_INSUFFICIENT_BUFFER",
            ErrorKind::UnknownReader => "SCARD_E_UNKNOWN_READER",
            ErrorKind::Timeout => "SCARD_E_TIMEOUT",
            ErrorKind::SharingViolation => "SCARD_E_SHARING_VIOLATION",
            ErrorKind::NoSmartCard => "SCARD_E_NO_SMARTCARD",
            ErrorKind::UnknownCard => "SCARD_E_UNKNOWN_CARD",
            ErrorKind::CantDispose => "SCARD_E_CANT_DISPOSE",
            ErrorKind::ProtoMismatch => "SCARD_E_PROTO_MISMATCH",
            ErrorKind::NotReady => "SCARD_E_NOT_READY",
            ErrorKind::InvalidValue => "SCARD_E_INVALID_VALUE",
            ErrorKind::SystemCancelled => "SCARD_E_SYSTEM_CANCELLED",
            ErrorKind::CommError => "SCARD_F_COMM_ERROR",
            ErrorKind::UnknownError => "SCARD_F_UNKNOWN_ERROR",
            ErrorKind::InvalidAtr => "SCARD_E_INVALID_ATR",
            ErrorKind::NotTransacted => "SCARD_E_NOT_TRANSACTED",
            ErrorKind::ReaderUnavailable => "SCARD_E_READER_UNAVAILABLE",
            ErrorKind::Shutdown => "SCARD_P_SHUTDOWN",
            ErrorKind::PciTooSmall => "SCARD_E_PCI_TOO_SMALL",
            ErrorKind::ReaderUnsupported => "SCARD_E_READER_UNSUPPORTED",
            ErrorKind::DuplicateReader => "SCARD_E_DUPLICATE_READER",
            ErrorKind::CardUnsupported => "SCARD_E_CARD_UNSUPPORTED",
            ErrorKind::NoService => "SCARD_E_NO_SERVICE",
            ErrorKind::ServiceStopped => "SCARD_E_SERVICE_STOPPED",
            ErrorKind::Unexpected => "SCARD_E_UNEXPECTED",
            ErrorKind::IccInstallation => "SCARD_E_ICC_INSTALLATION",
            ErrorKind::IccCreateOrder => "SCARD_E_ICC_CREATEORDER",
            ErrorKind::UnsupportedFeature => "SCARD_E_UNSUPPORTED_FEATURE",
            ErrorKind::DirNotFound => "SCARD_E_DIR_NOT_FOUND",
            ErrorKind::FileNotFound => "SCARD_E_FILE_NOT_FOUND",
            ErrorKind::NoDir => "SCARD_E_NO_DIR",
            ErrorKind::NoFile => "SCARD_E_NO_FILE",
            ErrorKind::NoAccess => "SCARD_E_NO_ACCESS",
            ErrorKind::WriteTooMany => "SCARD_E_WRITE_TOO_MANY",
            ErrorKind::BadSeek => "SCARD_E_BAD_SEEK",
            ErrorKind::InvalidChv => "SCARD_E_INVALID_CHV",
            ErrorKind::UnknownResMng => "SCARD_E_UNKNOWN_RES_MNG",
            ErrorKind::NoSuchCertificate => "SCARD_E_NO_SUCH_CERTIFICATE",
            ErrorKind::CertificateUnavailable => "SCARD_E_CERTIFICATE_UNAVAILABLE",
            ErrorKind::NoReadersAvailable => "SCARD_E_NO_READERS_AVAILABLE",
            ErrorKind::CommDataLost => "SCARD_E_COMM_DATA_LOST",
            ErrorKind::NoKeyContainer => "SCARD_E_NO_KEY_CONTAINER",
            ErrorKind::ServerTooBusy => "SCARD_E_SERVER_TOO_BUSY",
            ErrorKind::PinCacheExpired => "SCARD_E_PIN_CACHE_EXPIRED",
            ErrorKind::NoPinCache => "SCARD_E_NO_PIN_CACHE",
            ErrorKind::ReadOnlyCard => "SCARD_E_READ_ONLY_CARD",
            ErrorKind::UnsupportedCard => "SCARD_W_UNSUPPORTED_CARD",
            ErrorKind::UnresponsiveCard => "SCARD_W_UNRESPONSIVE_CARD",
            ErrorKind::UnpoweredCard => "SCARD_W_UNPOWERED_CARD",
            ErrorKind::ResetCard => "SCARD_W_RESET_CARD",
            ErrorKind::RemovedCard => "SCARD_W_REMOVED_CARD",
            ErrorKind::SecurityViolation => "SCARD_W_SECURITY_VIOLATION",
            ErrorKind::WrongChv => "SCARD_W_WRONG_CHV",
            ErrorKind::ChvBlocked => "SCARD_W_CHV_BLOCKED",
            ErrorKind::Eof => "SCARD_W_EOF",
            ErrorKind::CancelledByUser => "SCARD_W_CANCELLED_BY_USER",
            ErrorKind::CardNotAuthenticated => "SCARD_W_CARD_NOT_AUTHENTICATED",
        }
    }

    /// One-line human readable description.
    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::Success => "No error was encountered.",
            ErrorKind::InternalError => "An internal consistency check failed.",
            ErrorKind::Cancelled => "The action was cancelled by an SCardCancel request.",
            ErrorKind::InvalidHandle => "The supplied handle was invalid.",
            ErrorKind::InvalidParameter => "One or more of the supplied parameters could not be properly interpreted.",
            ErrorKind::InvalidTarget => "Registry startup information is missing or invalid.",
            ErrorKind::NoMemory => "Not enough memory available to complete this command.",
            ErrorKind::WaitedTooLong => "An internal consistency timer has expired.",
            ErrorKind::InsufficientBuffer => "The data buffer to receive returned data is too small for the returned data.",
            ErrorKind::UnknownReader => "The specified reader name is not recognized.",
            ErrorKind::Timeout => "The user-specified timeout value has expired.",
            ErrorKind::SharingViolation => "The smart card cannot be accessed because of other connections outstanding.",
            ErrorKind::NoSmartCard => "The operation requires a Smart Card, but no Smart Card is currently in the device.",
            ErrorKind::UnknownCard => "The specified smart card name is not recognized.",
            ErrorKind::CantDispose => "The system could not dispose of the media in the requested manner.",
            ErrorKind::ProtoMismatch => {
                "The requested protocols are incompatible with the protocol currently in use with the smart card."
            }
            ErrorKind::NotReady => "The reader or smart card is not ready to accept commands.",
            ErrorKind::InvalidValue => "One or more of the supplied parameters values could not be properly interpreted.",
            ErrorKind::SystemCancelled => "The action was cancelled by the system, presumably to log off or shut down.",
            ErrorKind::CommError => "An internal communications error has been detected.",
            ErrorKind::UnknownError => "An internal error has been detected, but the source is unknown.",
            ErrorKind::InvalidAtr => "An ATR obtained from the registry is not a valid ATR string.",
            ErrorKind::NotTransacted => "An attempt was made to end a non-existent transaction.",
            ErrorKind::ReaderUnavailable => "The specified reader is not currently available for use.",
            ErrorKind::Shutdown => "The operation has been aborted to allow the server application to exit.",
            ErrorKind::PciTooSmall => "The PCI Receive buffer was too small.",
            ErrorKind::ReaderUnsupported => "The reader driver does not meet minimal requirements for support.",
            ErrorKind::DuplicateReader => "The reader driver did not produce a unique reader name.",
            ErrorKind::CardUnsupported => "The smart card does not meet minimal requirements for support.",
            ErrorKind::NoService => "The Smart card resource manager is not running.",
            ErrorKind::ServiceStopped => "The Smart card resource manager has shut down.",
            ErrorKind::Unexpected => "An unexpected card error has occurred.",
            ErrorKind::IccInstallation => "No primary provider can be found for the smart card.",
            ErrorKind::IccCreateOrder => "The requested order of object creation is not supported.",
            ErrorKind::UnsupportedFeature => "This smart card does not support the requested feature.",
            ErrorKind::DirNotFound => "The identified directory does not exist in the smart card.",
            ErrorKind::FileNotFound => "The identified file does not exist in the smart card.",
            ErrorKind::NoDir => "The supplied path does not represent a smart card directory.",
            ErrorKind::NoFile => "The supplied path does not represent a smart card file.",
            ErrorKind::NoAccess => "Access is denied to this file.",
            ErrorKind::WriteTooMany => "The smart card does not have enough memory to store the information.",
            ErrorKind::BadSeek => "There was an error trying to set the smart card file object pointer.",
            ErrorKind::InvalidChv => "The supplied PIN is incorrect.",
            ErrorKind::UnknownResMng => "An unrecognized error code was returned from a layered component.",
            ErrorKind::NoSuchCertificate => "The requested certificate does not exist.",
            ErrorKind::CertificateUnavailable => "The requested certificate could not be obtained.",
            ErrorKind::NoReadersAvailable => "Cannot find a smart card reader.",
            ErrorKind::CommDataLost => "A communications error with the smart card has been detected.",
            ErrorKind::NoKeyContainer => "The requested key container does not exist on the smart card.",
            ErrorKind::ServerTooBusy => "The Smart Card Resource Manager is too busy to complete this operation.",
            ErrorKind::PinCacheExpired => "The smart card PIN cache has expired.",
            ErrorKind::NoPinCache => "The smart card PIN cannot be cached.",
            ErrorKind::ReadOnlyCard => "The smart card is read-only and cannot be written to.",
            ErrorKind::UnsupportedCard => "The reader cannot communicate with the card, due to ATR string configuration conflicts.",
            ErrorKind::UnresponsiveCard => "The smart card is not responding to a reset.",
            ErrorKind::UnpoweredCard => "Power has been removed from the smart card, so that further communication is not possible.",
            ErrorKind::ResetCard => "The smart card has been reset, so any shared state information is invalid.",
            ErrorKind::RemovedCard => "The smart card has been removed, so further communication is not possible.",
            ErrorKind::SecurityViolation => "Access was denied because of a security violation.",
            ErrorKind::WrongChv => "The card cannot be accessed because the wrong PIN was presented.",
            ErrorKind::ChvBlocked => {
                "The card cannot be accessed because the maximum number of PIN entry attempts has been reached."
            }
            ErrorKind::Eof => "The end of the smart card file has been reached.",
            ErrorKind::CancelledByUser => "The user pressed \"Cancel\" on a Smart Card Selection Dialog.",
            ErrorKind::CardNotAuthenticated => "No PIN was presented to the smart card.",
        }
    }
}

impl From<ErrorKind> for u32 {
    fn from(value: ErrorKind) -> Self {
        value as u32
    }
}
