//! Logging configuration for sqlshape.
//!
//! The library only emits `tracing` events; these helpers install a stderr
//! subscriber for applications and tests that do not bring their own.

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes stderr logging, filtered by `RUST_LOG` (default `info`).
///
/// Panics if a global subscriber is already installed.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Like [`init_stderr_logging`], but returns false instead of panicking
/// when a subscriber is already installed.
pub fn try_init_stderr_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
