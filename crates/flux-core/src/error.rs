//! Error types for flux-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// The record store could not serve the request; fatal for the command
    #[error("Record store unavailable: {0}")]
    Store(String),

    #[error("Invalid record id: {0}")]
    InvalidRecordId(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
