//! Workspace-aware resolution of the row an operation acts on
//!
//! Inside a draft workspace a move does not touch the live row: the host
//! persists to a move placeholder, and a separate version row carries the
//! draft state. Both must follow the live record's position.

use crate::Result;
use flux_core::{
    fields, Fields, OperationContext, Record, RecordStore, Uid, VersionState, POSITION_FIELDS,
};
use tracing::debug;

const PLACEHOLDER_FIELDS: &[&str] = &[fields::MOVE_ID, fields::VERSION_STATE, fields::DELETED];

/// Resolves live rows, move placeholders and workspace versions
pub struct VersionResolver<'a, S> {
    store: &'a S,
}

impl<'a, S: RecordStore> VersionResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The row a copy or move of `uid` should be applied to
    ///
    /// Outside a draft workspace this is the live row. Inside one it is the
    /// move placeholder for `uid` if there is one, otherwise the live row.
    /// The returned record always carries a uid.
    pub fn resolve_operative_record(
        &self,
        table: &str,
        uid: Uid,
        ctx: &OperationContext,
    ) -> Result<Record> {
        let live = self.store.fetch(table, uid, Fields::All)?;

        if ctx.in_draft_workspace() {
            if let Some(placeholder) = self.store.move_placeholder(table, uid, ctx.workspace())? {
                debug!(table, %uid, placeholder = ?placeholder.uid(), "operating on move placeholder");
                return Ok(placeholder);
            }
            let mut record = live.unwrap_or_default();
            record.set_uid(uid);
            return Ok(record);
        }

        Ok(match live {
            Some(record) if !record.is_empty() => record,
            _ => Record::with_uid(uid),
        })
    }

    /// The most recent workspace version of live record `uid`
    ///
    /// Only position fields are selected. Outside a draft workspace, or when
    /// the record has not been versioned yet, there is none.
    pub fn most_recent_version(
        &self,
        table: &str,
        uid: Uid,
        ctx: &OperationContext,
    ) -> Result<Option<Record>> {
        if !ctx.in_draft_workspace() {
            return Ok(None);
        }
        Ok(self.store.workspace_version(
            ctx.workspace(),
            table,
            uid,
            Fields::Only(POSITION_FIELDS),
        )?)
    }

    /// The live uid behind `uid`: the shadowed record if `uid` is a move
    /// placeholder, otherwise `uid` itself
    pub fn resolve_original_id(&self, table: &str, uid: Uid) -> Result<Uid> {
        let row = self
            .store
            .fetch(table, uid, Fields::Only(PLACEHOLDER_FIELDS))?;
        Ok(row
            .filter(|row| row.version_state() == VersionState::MovePlaceholder && !row.is_deleted())
            .and_then(|row| row.move_id())
            .unwrap_or(uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_core::{MemoryStore, WorkspaceId};

    const TABLE: &str = "tt_content";

    fn fixture() -> MemoryStore {
        let store = MemoryStore::new();

        let mut live = Record::with_uid(Uid(1));
        live.set("header", "Live");
        live.set_sorting(256);
        store.insert(TABLE, live);

        let mut placeholder = Record::with_uid(Uid(2));
        placeholder.set(fields::VERSION_STATE, 3);
        placeholder.set(fields::MOVE_ID, 1);
        placeholder.set(fields::WORKSPACE, 7);
        store.insert(TABLE, placeholder);

        let mut version = Record::with_uid(Uid(3));
        version.set(fields::ORIGINAL_ID, 1);
        version.set(fields::WORKSPACE, 7);
        version.set("header", "Draft");
        version.set_sorting(512);
        store.insert(TABLE, version);

        store
    }

    #[test]
    fn test_live_workspace_returns_live_row() {
        let store = fixture();
        let resolver = VersionResolver::new(&store);
        let ctx = OperationContext::new();

        let record = resolver
            .resolve_operative_record(TABLE, Uid(1), &ctx)
            .expect("resolve");
        assert_eq!(record.get("header").and_then(|v| v.as_str()), Some("Live"));
    }

    #[test]
    fn test_missing_row_gets_uid() {
        let store = fixture();
        let resolver = VersionResolver::new(&store);
        let ctx = OperationContext::new();

        let record = resolver
            .resolve_operative_record(TABLE, Uid(40), &ctx)
            .expect("resolve");
        assert_eq!(record, Record::with_uid(Uid(40)));
    }

    #[test]
    fn test_draft_workspace_prefers_placeholder() {
        let store = fixture();
        let resolver = VersionResolver::new(&store);
        let ctx = OperationContext::new().with_workspace(WorkspaceId::new(7));

        let record = resolver
            .resolve_operative_record(TABLE, Uid(1), &ctx)
            .expect("resolve");
        assert_eq!(record.uid(), Some(Uid(2)));

        let other = OperationContext::new().with_workspace(WorkspaceId::new(8));
        let record = resolver
            .resolve_operative_record(TABLE, Uid(1), &other)
            .expect("resolve");
        assert_eq!(record.uid(), Some(Uid(1)));
        assert_eq!(record.get("header").and_then(|v| v.as_str()), Some("Live"));
    }

    #[test]
    fn test_most_recent_version() {
        let store = fixture();
        let resolver = VersionResolver::new(&store);

        let live = OperationContext::new();
        assert!(resolver
            .most_recent_version(TABLE, Uid(1), &live)
            .expect("lookup")
            .is_none());

        let draft = OperationContext::new().with_workspace(WorkspaceId::new(7));
        let version = resolver
            .most_recent_version(TABLE, Uid(1), &draft)
            .expect("lookup")
            .expect("version");
        assert_eq!(version.uid(), Some(Uid(3)));
        assert_eq!(version.sorting(), 512);
        assert!(!version.contains("header"));

        assert!(resolver
            .most_recent_version(TABLE, Uid(3), &draft)
            .expect("lookup")
            .is_none());
    }

    #[test]
    fn test_resolve_original_id() {
        let store = fixture();
        let resolver = VersionResolver::new(&store);

        assert_eq!(resolver.resolve_original_id(TABLE, Uid(2)).expect("resolve"), Uid(1));
        assert_eq!(resolver.resolve_original_id(TABLE, Uid(1)).expect("resolve"), Uid(1));
        assert_eq!(resolver.resolve_original_id(TABLE, Uid(99)).expect("resolve"), Uid(99));
    }

    #[test]
    fn test_deleted_placeholder_is_not_followed() {
        let store = fixture();
        store
            .update(TABLE, Uid(2), &[(fields::DELETED, 1)].into_iter().collect())
            .expect("update");
        let resolver = VersionResolver::new(&store);
        assert_eq!(resolver.resolve_original_id(TABLE, Uid(2)).expect("resolve"), Uid(2));
    }
}
