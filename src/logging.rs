use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::env::{SCARD_LOG_LEVEL_ENV, SCARD_LOG_PATH_ENV};

static SETUP: Once = Once::new();

/// Installs a global `tracing` subscriber that writes to the file named by `SCARD_LOG_PATH`.
///
/// The crate never calls it by itself. Applications that do not install their own subscriber can call it once at
/// startup.
///
/// Does nothing if the variable is not set or the file can not be opened. Events are filtered with the
/// `SCARD_LOG_LEVEL` directives. This function can be called multiple times safely, but it will not replace a
/// subscriber that the application installed before.
pub fn setup_logger() {
    SETUP.call_once(|| {
        let path = if let Ok(path) = std::env::var(SCARD_LOG_PATH_ENV) {
            PathBuf::from(path)
        } else {
            return;
        };

        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("[SCARD-DEBUG] Couldn't open log file {}: {e}", path.display());
                return;
            }
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_thread_names(true)
            .with_ansi(false)
            .with_writer(file);

        let installed = tracing_subscriber::registry()
            .with(fmt_layer)
            .with(EnvFilter::from_env(SCARD_LOG_LEVEL_ENV))
            .try_init();

        if installed.is_ok() {
            debug!(?path, "Logger is set up");
        }
    })
}
