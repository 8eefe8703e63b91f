//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Panics if a global logger is already installed; use [`try_init`] from
/// tests or when embedding the scene in a host that may own logging.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system unless a logger is already installed
///
/// Returns `true` when this call installed the logger.
pub fn try_init() -> bool {
    env_logger::builder().is_test(cfg!(test)).try_init().is_ok()
}
