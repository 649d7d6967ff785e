//! Record store contract and an in-memory implementation

use crate::record::fields;
use crate::{Record, Result, Uid, VersionState, WorkspaceId};
use indexmap::IndexMap;
use parking_lot::RwLock;

/// Field projection for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fields<'a> {
    /// Every field of the row (`*`)
    All,
    /// Only the named fields
    Only(&'a [&'a str]),
}

impl Fields<'_> {
    /// Apply this projection to a full row
    pub fn select(&self, record: &Record) -> Record {
        match self {
            Fields::All => record.clone(),
            Fields::Only(names) => record.project(names),
        }
    }
}

/// Narrow access to the host's record persistence
///
/// Implementations are synchronous and assumed consistent for the duration
/// of a command. Any `Err` means the store is unavailable and aborts the
/// current command; there are no retries.
pub trait RecordStore {
    /// Fetch a row by table and uid
    fn fetch(&self, table: &str, uid: Uid, fields: Fields<'_>) -> Result<Option<Record>>;

    /// Write the given fields to the row; the `uid` field itself is never written.
    /// Updating a row that does not exist is a no-op.
    fn update(&self, table: &str, uid: Uid, fields: &Record) -> Result<()>;

    /// The active move placeholder standing in for `uid` inside `workspace`
    fn move_placeholder(
        &self,
        table: &str,
        uid: Uid,
        workspace: WorkspaceId,
    ) -> Result<Option<Record>>;

    /// The workspace-specific version of the live record `uid`
    fn workspace_version(
        &self,
        workspace: WorkspaceId,
        table: &str,
        uid: Uid,
        fields: Fields<'_>,
    ) -> Result<Option<Record>>;
}

/// Whether `row` is the move placeholder for `uid` in `workspace`
pub fn is_move_placeholder_for(row: &Record, uid: Uid, workspace: WorkspaceId) -> bool {
    row.version_state() == VersionState::MovePlaceholder
        && row.move_id() == Some(uid)
        && row.workspace() == workspace
        && !row.is_deleted()
}

/// Whether `row` is the version of live record `uid` in `workspace`
pub fn is_workspace_version_of(row: &Record, uid: Uid, workspace: WorkspaceId) -> bool {
    row.original_id() == Some(uid) && row.workspace() == workspace && !row.is_deleted()
}

/// In-memory record store
///
/// Rows are kept per table in insertion order. Every applied update is
/// journaled so callers can inspect what was written and in which order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<IndexMap<String, IndexMap<Uid, Record>>>,
    journal: RwLock<Vec<(String, Uid)>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a full row; rows without a uid are ignored
    pub fn insert(&self, table: &str, record: Record) -> Option<Uid> {
        let uid = record.uid()?;
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(uid, record);
        Some(uid)
    }

    /// Get a copy of a full row
    pub fn get(&self, table: &str, uid: Uid) -> Option<Record> {
        self.tables
            .read()
            .get(table)
            .and_then(|rows| rows.get(&uid))
            .cloned()
    }

    /// Names of all tables holding rows
    pub fn tables(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    /// Number of rows in a table
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |rows| rows.len())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().values().all(|rows| rows.is_empty())
    }

    /// Updates applied so far, oldest first
    pub fn updates(&self) -> Vec<(String, Uid)> {
        self.journal.read().clone()
    }

    fn find(&self, table: &str, predicate: impl Fn(&Record) -> bool) -> Option<Record> {
        self.tables
            .read()
            .get(table)
            .and_then(|rows| rows.values().find(|row| predicate(row)).cloned())
    }
}

impl RecordStore for MemoryStore {
    fn fetch(&self, table: &str, uid: Uid, fields: Fields<'_>) -> Result<Option<Record>> {
        Ok(self.get(table, uid).map(|row| fields.select(&row)))
    }

    fn update(&self, table: &str, uid: Uid, values: &Record) -> Result<()> {
        let mut tables = self.tables.write();
        let Some(row) = tables.get_mut(table).and_then(|rows| rows.get_mut(&uid)) else {
            tracing::debug!(table, %uid, "update of missing row ignored");
            return Ok(());
        };
        for (key, value) in values.iter() {
            if key != fields::UID {
                row.set(key.clone(), value.clone());
            }
        }
        self.journal.write().push((table.to_string(), uid));
        Ok(())
    }

    fn move_placeholder(
        &self,
        table: &str,
        uid: Uid,
        workspace: WorkspaceId,
    ) -> Result<Option<Record>> {
        Ok(self.find(table, |row| is_move_placeholder_for(row, uid, workspace)))
    }

    fn workspace_version(
        &self,
        workspace: WorkspaceId,
        table: &str,
        uid: Uid,
        fields: Fields<'_>,
    ) -> Result<Option<Record>> {
        Ok(self
            .find(table, |row| is_workspace_version_of(row, uid, workspace))
            .map(|row| fields.select(&row)))
    }
}
