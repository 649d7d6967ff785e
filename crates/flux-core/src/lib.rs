//! Flux Core - record model and host collaborator contracts
//!
//! This crate provides the types every other flux crate builds on:
//! - Scalar field values and record rows (`Value`, `Record`)
//! - Record, uid and workspace identifiers
//! - The `RecordStore` contract and an in-memory `MemoryStore`
//! - The request-scoped `OperationContext` standing in for the host engine
//! - Parsing of clipboard, request parameter and AJAX move payloads
//!
//! ## Container model
//!
//! Content records nest inside named columns of other content records.
//! A record's `tx_flux_parent` names its container (0 at top level) and
//! `tx_flux_column` the column inside it; `sorting` orders siblings.

mod context;
mod error;
mod identity;
mod message;
pub mod record;
pub mod request;
mod store;
mod value;

pub use context::{CommandVerb, OperationContext, PendingCommand, ProviderFailure, RecordStatus};
pub use error::{Error, Result};
pub use identity::{RecordId, Uid, WorkspaceId};
pub use message::{FlashMessage, Severity};
pub use record::{fields, Record, VersionState, POSITION_FIELDS};
pub use request::{AreaReference, ClipboardCommand, ClipboardContext, Request};
pub use store::{is_move_placeholder_for, is_workspace_version_of, Fields, MemoryStore, RecordStore};
pub use value::{Value, ValueMap};
