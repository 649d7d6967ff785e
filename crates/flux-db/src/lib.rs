//! Flux DB - Database layer using native_db
//!
//! Persists record rows of any table and implements the record store
//! contract on top of them, including the workspace lookups for move
//! placeholders and versions.

mod error;
mod models;
mod store;

pub use error::{Error, Result};
pub use models::StoredRecord;
pub use store::Store;
