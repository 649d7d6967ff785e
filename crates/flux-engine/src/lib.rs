//! Flux Engine - keeps nested content trees consistent across moves
//!
//! Content records nest through a parent pointer and a named column of the
//! parent. This crate owns the rules that keep that tree sound while the
//! host copies, moves and pastes records:
//!
//! ```text
//! Engine (store + providers + config)
//!  │
//!  ├── MoveCoordinator ── computes placements, persists live then draft row
//!  │    ├── TreeGuard ── refuses moves into a record's own subtree
//!  │    └── VersionResolver ── live row, move placeholder, workspace version
//!  │
//!  ├── ProviderDispatcher ── lifecycle callbacks on matching providers
//!  └── CacheSweep ── one cache clear fan-out per process
//! ```
//!
//! The engine is synchronous and request scoped. The host's operation
//! context is passed into every call; nothing is held in statics.

mod cache;
mod config;
mod coordinator;
mod engine;
mod error;
pub mod placement;
pub mod provider;
mod tree_guard;
mod version;

pub use cache::{CacheCommand, CacheSweep};
pub use config::EngineConfig;
pub use coordinator::{MoveCoordinator, MoveOutcome, MoveReport, MoveRequest};
pub use engine::Engine;
pub use error::{Error, Result};
pub use placement::{MoveTarget, Placement, Proposal};
pub use provider::{
    CommandArguments, ConfigurationProvider, Invocation, Lifecycle, ProviderDispatcher,
    ProviderError, ProviderRegistry, ProviderResult, ProviderSet,
};
pub use tree_guard::TreeGuard;
pub use version::VersionResolver;
