//! Cycle detection for container moves
//!
//! A record may never become its own ancestor. Before a move is persisted
//! the guard walks the ancestor chain of the proposed parent; reaching the
//! moved record means the move would close a loop. A move placeholder is
//! the record it shadows, so both uids count as the moved record.

use crate::version::VersionResolver;
use crate::Result;
use flux_core::{fields, Fields, Record, RecordStore, Uid};
use std::collections::HashSet;
use tracing::warn;

const PARENT_ONLY: &[&str] = &[fields::PARENT];

/// Walks parent pointers to detect would-be cycles
pub struct TreeGuard<'a, S> {
    store: &'a S,
    max_depth: usize,
}

impl<'a, S: RecordStore> TreeGuard<'a, S> {
    pub fn new(store: &'a S, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    /// Returns true if giving `record` the parent `proposed_parent` would
    /// make it a descendant of itself
    ///
    /// Parent pointers always name live uids, so the chain is compared
    /// against the live record behind `record` as well as `record` itself.
    ///
    /// The walk ends at a top-level ancestor (parent 0) or at a parent id
    /// with no row behind it. A chain that loops without passing `record`,
    /// or that is longer than the configured depth, is corrupt: the guard
    /// logs it and reports a cycle so the move is refused.
    pub fn would_create_cycle(
        &self,
        table: &str,
        record: &Record,
        proposed_parent: Option<Uid>,
    ) -> Result<bool> {
        let Some(uid) = record.uid() else {
            return Ok(false);
        };
        let original = match record.move_id() {
            Some(shadowed) => shadowed,
            None => VersionResolver::new(self.store).resolve_original_id(table, uid)?,
        };

        let mut visited = HashSet::new();
        let mut current = proposed_parent;
        while let Some(ancestor) = current {
            if ancestor == uid || ancestor == original {
                return Ok(true);
            }
            if !visited.insert(ancestor) || visited.len() > self.max_depth {
                warn!(
                    table,
                    %uid,
                    %ancestor,
                    depth = visited.len(),
                    "ancestor chain is corrupt; treating move as a cycle"
                );
                return Ok(true);
            }
            current = self
                .store
                .fetch(table, ancestor, Fields::Only(PARENT_ONLY))?
                .and_then(|row| row.parent());
        }
        Ok(false)
    }
}
