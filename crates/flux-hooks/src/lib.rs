//! Flux Hooks - host lifecycle hooks for nested content containers
//!
//! [`HookEntryPoints`] is the object the host's record-editing engine
//! calls at its fixed hook points. It owns an [`flux_engine::Engine`]
//! and the per-process [`flux_engine::CacheSweep`], and translates each
//! hook's arguments into engine calls.
//!
//! ```ignore
//! use flux_core::MemoryStore;
//! use flux_engine::{Engine, EngineConfig, ProviderSet};
//! use flux_hooks::HookEntryPoints;
//!
//! let config = EngineConfig::load_file("flux.ron")?;
//! let providers = ProviderSet::new(config.record_type_field.clone());
//! let hooks = HookEntryPoints::new(Engine::new(MemoryStore::new(), providers, config));
//! ```

mod error;
mod hooks;
pub mod logging;

pub use error::{Error, Result};
pub use hooks::{Disposition, HookEntryPoints};
