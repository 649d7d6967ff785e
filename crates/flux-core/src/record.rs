//! Record rows and their position-related fields

use crate::{Uid, Value, ValueMap, WorkspaceId};
use serde::{Deserialize, Serialize};

/// Field names used by the container model
pub mod fields {
    pub const UID: &str = "uid";
    pub const PID: &str = "pid";
    pub const PARENT: &str = "tx_flux_parent";
    pub const COLUMN: &str = "tx_flux_column";
    pub const SORTING: &str = "sorting";
    pub const COL_POS: &str = "colPos";
    pub const MOVE_ID: &str = "t3ver_move_id";
    pub const VERSION_STATE: &str = "t3ver_state";
    pub const ORIGINAL_ID: &str = "t3ver_oid";
    pub const WORKSPACE: &str = "t3ver_wsid";
    pub const DELETED: &str = "deleted";
}

/// Fields selected when looking up the most recent version of a record
pub const POSITION_FIELDS: &[&str] = &[
    fields::UID,
    fields::COL_POS,
    fields::PARENT,
    fields::COLUMN,
    fields::SORTING,
    fields::MOVE_ID,
];

/// Versioning state of a row (`t3ver_state`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionState {
    #[default]
    Default,
    NewPlaceholder,
    DeletePlaceholder,
    /// Stands in for a live record moved inside a draft workspace
    MovePlaceholder,
    MovePointer,
    NewPlaceholderVersion,
    Other(i64),
}

impl VersionState {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => VersionState::Default,
            1 => VersionState::NewPlaceholder,
            2 => VersionState::DeletePlaceholder,
            3 => VersionState::MovePlaceholder,
            4 => VersionState::MovePointer,
            -1 => VersionState::NewPlaceholderVersion,
            other => VersionState::Other(other),
        }
    }

    pub fn raw(&self) -> i64 {
        match self {
            VersionState::Default => 0,
            VersionState::NewPlaceholder => 1,
            VersionState::DeletePlaceholder => 2,
            VersionState::MovePlaceholder => 3,
            VersionState::MovePointer => 4,
            VersionState::NewPlaceholderVersion => -1,
            VersionState::Other(raw) => *raw,
        }
    }
}

/// A record row: named fields mapped to scalar values
///
/// Rows may be partial projections, so every typed accessor tolerates a
/// missing field and falls back to the host's default for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: ValueMap,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record holding only its uid
    pub fn with_uid(uid: Uid) -> Self {
        let mut record = Self::new();
        record.set_uid(uid);
        record
    }

    /// Wrap an existing field map
    pub fn from_fields(fields: ValueMap) -> Self {
        Self { fields }
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &ValueMap {
        &self.fields
    }

    pub fn into_fields(self) -> ValueMap {
        self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Overwrite fields with the given overrides
    pub fn merge(&mut self, overrides: &ValueMap) {
        for (key, value) in overrides {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Copy of this record restricted to the named fields that are present
    pub fn project(&self, names: &[&str]) -> Record {
        let fields = names
            .iter()
            .filter_map(|name| {
                self.fields
                    .get(*name)
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect();
        Record { fields }
    }

    fn int(&self, key: &str) -> i64 {
        self.fields.get(key).map(Value::to_int).unwrap_or(0)
    }

    pub fn uid(&self) -> Option<Uid> {
        Uid::from_int(self.int(fields::UID))
    }

    pub fn set_uid(&mut self, uid: Uid) {
        self.set(fields::UID, uid.raw());
    }

    pub fn pid(&self) -> i64 {
        self.int(fields::PID)
    }

    /// The container record this record is nested in, `None` at top level
    pub fn parent(&self) -> Option<Uid> {
        Uid::from_int(self.int(fields::PARENT))
    }

    pub fn set_parent(&mut self, parent: Option<Uid>) {
        self.set(fields::PARENT, parent.map(|uid| uid.raw()).unwrap_or(0));
    }

    /// Name of the column inside the parent; empty at top level
    pub fn column(&self) -> String {
        self.fields
            .get(fields::COLUMN)
            .map(Value::to_text)
            .unwrap_or_default()
    }

    pub fn set_column(&mut self, column: impl Into<String>) {
        self.set(fields::COLUMN, column.into());
    }

    pub fn sorting(&self) -> i64 {
        self.int(fields::SORTING)
    }

    pub fn set_sorting(&mut self, sorting: i64) {
        self.set(fields::SORTING, sorting);
    }

    pub fn col_pos(&self) -> i64 {
        self.int(fields::COL_POS)
    }

    pub fn set_col_pos(&mut self, col_pos: i64) {
        self.set(fields::COL_POS, col_pos);
    }

    /// The live record a move placeholder shadows
    pub fn move_id(&self) -> Option<Uid> {
        Uid::from_int(self.int(fields::MOVE_ID))
    }

    pub fn version_state(&self) -> VersionState {
        VersionState::from_raw(self.int(fields::VERSION_STATE))
    }

    /// The live record a workspace version belongs to
    pub fn original_id(&self) -> Option<Uid> {
        Uid::from_int(self.int(fields::ORIGINAL_ID))
    }

    pub fn workspace(&self) -> WorkspaceId {
        WorkspaceId::new(self.int(fields::WORKSPACE).max(0) as u64)
    }

    pub fn is_deleted(&self) -> bool {
        self.int(fields::DELETED) != 0
    }
}

impl From<ValueMap> for Record {
    fn from(fields: ValueMap) -> Self {
        Self::from_fields(fields)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_accessors() {
        let mut record = Record::with_uid(Uid(10));
        record.set_parent(Some(Uid(4)));
        record.set_column("content");
        record.set_sorting(256);
        record.set_col_pos(18181);

        assert_eq!(record.uid(), Some(Uid(10)));
        assert_eq!(record.parent(), Some(Uid(4)));
        assert_eq!(record.column(), "content");
        assert_eq!(record.sorting(), 256);
        assert_eq!(record.col_pos(), 18181);

        record.set_parent(None);
        assert_eq!(record.parent(), None);
        assert_eq!(record.get(fields::PARENT), Some(&Value::Int(0)));
    }

    #[test]
    fn test_missing_fields_use_host_defaults() {
        let record = Record::new();
        assert_eq!(record.uid(), None);
        assert_eq!(record.parent(), None);
        assert_eq!(record.column(), "");
        assert_eq!(record.sorting(), 0);
        assert_eq!(record.version_state(), VersionState::Default);
        assert!(!record.is_deleted());
    }

    #[test]
    fn test_string_fields_are_cast() {
        let record: Record = [("uid", "12"), ("tx_flux_parent", "7"), ("t3ver_state", "3")]
            .into_iter()
            .collect();
        assert_eq!(record.uid(), Some(Uid(12)));
        assert_eq!(record.parent(), Some(Uid(7)));
        assert_eq!(record.version_state(), VersionState::MovePlaceholder);
    }

    #[test]
    fn test_merge_and_project() {
        let mut record = Record::with_uid(Uid(1));
        record.set("header", "Hello");
        let mut overrides = ValueMap::new();
        overrides.insert("colPos".to_string(), Value::Int(2));
        overrides.insert("header".to_string(), Value::from("Bye"));
        record.merge(&overrides);

        assert_eq!(record.col_pos(), 2);
        assert_eq!(record.get("header").and_then(Value::as_str), Some("Bye"));

        let projected = record.project(&["uid", "colPos", "sorting"]);
        assert_eq!(projected.len(), 2);
        assert!(!projected.contains("header"));
    }

    #[test]
    fn test_version_state_round_trip() {
        for raw in [-1, 0, 1, 2, 3, 4, 9] {
            assert_eq!(VersionState::from_raw(raw).raw(), raw);
        }
    }
}
