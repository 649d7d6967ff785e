//! Record row model for database storage.

use crate::error::{Error, Result};
use flux_core::{Record, Uid, ValueMap};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// A stored record row of any table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredRecord {
    /// Primary key - `<table>:<uid>`.
    #[primary_key]
    pub key: String,
    /// Table the row belongs to.
    #[secondary_key]
    pub table: String,
    pub uid: u64,
    /// Serialized field map.
    pub fields: Vec<u8>,
}

impl StoredRecord {
    /// Primary key of a row.
    pub fn key(table: &str, uid: Uid) -> String {
        format!("{}:{}", table, uid)
    }

    /// Create from a record, which must carry a uid.
    pub fn from_record(table: &str, record: &Record) -> Result<Self> {
        let uid = record
            .uid()
            .ok_or_else(|| Error::MissingUid(table.to_string()))?;
        Ok(Self {
            key: Self::key(table, uid),
            table: table.to_string(),
            uid: uid.raw(),
            fields: bincode::serialize(record.fields())?,
        })
    }

    /// Convert back to a record.
    pub fn to_record(&self) -> Result<Record> {
        let fields: ValueMap = bincode::deserialize(&self.fields)?;
        Ok(Record::from_fields(fields))
    }
}
