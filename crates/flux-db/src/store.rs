//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use flux_core::{
    fields, is_move_placeholder_for, is_workspace_version_of, Fields, Record, RecordStore, Uid,
    WorkspaceId,
};
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredRecord>().unwrap();
    models
});

/// Persistent record store.
pub struct Store {
    pub(crate) db: Database<'static>,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Insert or replace a row.
    pub fn insert(&self, table: &str, record: &Record) -> Result<Uid> {
        let stored = StoredRecord::from_record(table, record)?;
        let uid = Uid(stored.uid);
        let rw = self.db.rw_transaction()?;
        rw.upsert(stored)?;
        rw.commit()?;
        Ok(uid)
    }

    /// Load a full row.
    pub fn load(&self, table: &str, uid: Uid) -> Result<Option<Record>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredRecord> = r.get().primary(StoredRecord::key(table, uid))?;
        stored.map(|s| s.to_record()).transpose()
    }

    /// Delete a row.
    pub fn remove(&self, table: &str, uid: Uid) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredRecord> = rw.get().primary(StoredRecord::key(table, uid))?;
        if let Some(s) = stored {
            rw.remove(s)?;
        }
        rw.commit()?;
        Ok(())
    }

    /// All rows of a table.
    pub fn records(&self, table: &str) -> Result<Vec<Record>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredRecord>(StoredRecordKey::table)?;
        let iter = scan.start_with(table)?;
        let rows: std::result::Result<Vec<StoredRecord>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        // The key scan is a prefix match; "tt_content" also finds "tt_content_x".
        rows.into_iter()
            .filter(|row| row.table == table)
            .map(|row| row.to_record())
            .collect()
    }

    /// Number of rows in a table.
    pub fn count(&self, table: &str) -> Result<usize> {
        Ok(self.records(table)?.len())
    }

    fn find(&self, table: &str, predicate: impl Fn(&Record) -> bool) -> Result<Option<Record>> {
        Ok(self.records(table)?.into_iter().find(|row| predicate(row)))
    }
}

impl RecordStore for Store {
    fn fetch(&self, table: &str, uid: Uid, fields: Fields<'_>) -> flux_core::Result<Option<Record>> {
        Ok(self.load(table, uid)?.map(|row| fields.select(&row)))
    }

    fn update(&self, table: &str, uid: Uid, values: &Record) -> flux_core::Result<()> {
        let rw = self.db.rw_transaction().map_err(Error::from)?;
        let stored: Option<StoredRecord> = rw
            .get()
            .primary(StoredRecord::key(table, uid))
            .map_err(Error::from)?;
        let Some(stored) = stored else {
            debug!(table, %uid, "update of missing row ignored");
            return Ok(());
        };

        let mut row = stored.to_record()?;
        for (key, value) in values.iter() {
            if key != fields::UID {
                row.set(key.clone(), value.clone());
            }
        }
        let updated = StoredRecord {
            fields: bincode::serialize(row.fields()).map_err(Error::from)?,
            ..stored
        };
        rw.upsert(updated).map_err(Error::from)?;
        rw.commit().map_err(Error::from)?;
        Ok(())
    }

    fn move_placeholder(
        &self,
        table: &str,
        uid: Uid,
        workspace: WorkspaceId,
    ) -> flux_core::Result<Option<Record>> {
        Ok(self.find(table, |row| is_move_placeholder_for(row, uid, workspace))?)
    }

    fn workspace_version(
        &self,
        workspace: WorkspaceId,
        table: &str,
        uid: Uid,
        fields: Fields<'_>,
    ) -> flux_core::Result<Option<Record>> {
        Ok(self
            .find(table, |row| is_workspace_version_of(row, uid, workspace))?
            .map(|row| fields.select(&row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_core::Value;

    const TABLE: &str = "tt_content";

    fn row(uid: u64, parent: u64) -> Record {
        let mut record = Record::with_uid(Uid(uid));
        record.set_parent(Uid::from_int(parent as i64));
        record.set_column(if parent > 0 { "main" } else { "" });
        record.set("header", format!("Element {}", uid));
        record
    }

    #[test]
    fn test_insert_and_fetch() {
        let store = Store::in_memory().expect("open");
        store.insert(TABLE, &row(1, 0)).expect("insert");
        store.insert(TABLE, &row(2, 1)).expect("insert");

        let full = store
            .fetch(TABLE, Uid(2), Fields::All)
            .expect("fetch")
            .expect("row");
        assert_eq!(full.parent(), Some(Uid(1)));
        assert_eq!(full.get("header"), Some(&Value::from("Element 2")));

        let parent_only = store
            .fetch(TABLE, Uid(2), Fields::Only(&[fields::PARENT]))
            .expect("fetch")
            .expect("row");
        assert_eq!(parent_only.len(), 1);

        assert!(store.fetch(TABLE, Uid(3), Fields::All).expect("fetch").is_none());
    }

    #[test]
    fn test_update_never_writes_uid() {
        let store = Store::in_memory().expect("open");
        store.insert(TABLE, &row(1, 0)).expect("insert");

        let mut changes = Record::with_uid(Uid(99));
        changes.set_sorting(512);
        store.update(TABLE, Uid(1), &changes).expect("update");

        let stored = store.load(TABLE, Uid(1)).expect("load").expect("row");
        assert_eq!(stored.uid(), Some(Uid(1)));
        assert_eq!(stored.sorting(), 512);
        assert!(store.load(TABLE, Uid(99)).expect("load").is_none());
    }

    #[test]
    fn test_update_of_missing_row_is_a_no_op() {
        let store = Store::in_memory().expect("open");
        let mut changes = Record::new();
        changes.set_sorting(1);
        store.update(TABLE, Uid(5), &changes).expect("update");
        assert_eq!(store.count(TABLE).expect("count"), 0);
    }

    #[test]
    fn test_tables_are_kept_apart() {
        let store = Store::in_memory().expect("open");
        store.insert(TABLE, &row(1, 0)).expect("insert");
        store.insert("tt_content_archive", &row(1, 0)).expect("insert");
        store.insert("pages", &row(1, 0)).expect("insert");

        assert_eq!(store.count(TABLE).expect("count"), 1);
        store.remove("pages", Uid(1)).expect("remove");
        assert_eq!(store.count("pages").expect("count"), 0);
        assert_eq!(store.count(TABLE).expect("count"), 1);
    }

    #[test]
    fn test_workspace_lookups() {
        let store = Store::in_memory().expect("open");
        store.insert(TABLE, &row(1, 0)).expect("insert");

        let mut placeholder = Record::with_uid(Uid(2));
        placeholder.set(fields::VERSION_STATE, 3);
        placeholder.set(fields::MOVE_ID, 1);
        placeholder.set(fields::WORKSPACE, 4);
        store.insert(TABLE, &placeholder).expect("insert");

        let mut version = row(3, 0);
        version.set(fields::ORIGINAL_ID, 1);
        version.set(fields::WORKSPACE, 4);
        store.insert(TABLE, &version).expect("insert");

        let ws = WorkspaceId::new(4);
        let found = store.move_placeholder(TABLE, Uid(1), ws).expect("lookup");
        assert_eq!(found.and_then(|row| row.uid()), Some(Uid(2)));
        assert!(store
            .move_placeholder(TABLE, Uid(1), WorkspaceId::new(5))
            .expect("lookup")
            .is_none());

        let found = store
            .workspace_version(ws, TABLE, Uid(1), Fields::Only(&[fields::UID]))
            .expect("lookup")
            .expect("version");
        assert_eq!(found.uid(), Some(Uid(3)));
        assert!(!found.contains("header"));
    }

    #[test]
    fn test_record_without_uid_is_refused() {
        let store = Store::in_memory().expect("open");
        let error = store.insert(TABLE, &Record::new()).unwrap_err();
        assert!(matches!(error, Error::MissingUid(_)));
    }
}
