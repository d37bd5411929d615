/// Path to the native smart card library.
///
/// Overrides `WinSCard.dll`, the macOS `PCSC.framework` or `libpcsclite.so.1`.
pub const SCARD_LIB_PATH_ENV: &str = "SCARD_LIB_PATH";
/// File that [crate::logging::setup_logger] appends the log to.
pub const SCARD_LOG_PATH_ENV: &str = "SCARD_LOG_PATH";
/// [tracing_subscriber::EnvFilter] directives for [crate::logging::setup_logger].
pub const SCARD_LOG_LEVEL_ENV: &str = "SCARD_LOG_LEVEL";
