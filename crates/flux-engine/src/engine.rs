//! Engine - the store, provider registry and configuration bundled together

use crate::coordinator::MoveCoordinator;
use crate::provider::{ProviderDispatcher, ProviderRegistry};
use crate::version::VersionResolver;
use crate::EngineConfig;
use flux_core::RecordStore;

/// Owns the collaborators and hands out the per-operation components
pub struct Engine<S, R> {
    store: S,
    registry: R,
    config: EngineConfig,
}

impl<S: RecordStore, R: ProviderRegistry> Engine<S, R> {
    pub fn new(store: S, registry: R, config: EngineConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn versions(&self) -> VersionResolver<'_, S> {
        VersionResolver::new(&self.store)
    }

    pub fn coordinator(&self) -> MoveCoordinator<'_, S> {
        MoveCoordinator::new(&self.store, &self.config)
    }

    pub fn dispatcher(&self) -> ProviderDispatcher<'_, S, R> {
        ProviderDispatcher::new(&self.store, &self.registry)
    }
}
