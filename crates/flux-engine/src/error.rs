//! Error types for flux-engine

use thiserror::Error;

/// Result type for flux-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort the current command
///
/// Cycle violations are not errors; they are reported through
/// [`crate::MoveOutcome::Rejected`] and a flash message.
#[derive(Debug, Error)]
pub enum Error {
    /// Store or data error from flux-core
    #[error("core error: {0}")]
    Core(#[from] flux_core::Error),

    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ron::error::SpannedError> for Error {
    fn from(err: ron::error::SpannedError) -> Self {
        Error::Config(err.to_string())
    }
}

// Errors cross the host boundary, possibly onto another thread.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
