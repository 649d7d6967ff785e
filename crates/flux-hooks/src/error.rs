//! Error types for flux-hooks

use thiserror::Error;

/// Result type for hook calls
pub type Result<T> = std::result::Result<T, Error>;

/// Errors propagated to the host; each aborts the current command
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Engine(#[from] flux_engine::Error),

    #[error(transparent)]
    Core(#[from] flux_core::Error),

    /// The tracing subscriber could not be installed
    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
