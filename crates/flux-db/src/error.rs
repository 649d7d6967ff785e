//! Error types for database operations.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// Field map could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A row was stored without a uid.
    #[error("Record of table {0} has no uid")]
    MissingUid(String),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// The engine only sees store failures through the core error type.
impl From<Error> for flux_core::Error {
    fn from(err: Error) -> Self {
        flux_core::Error::Store(err.to_string())
    }
}
