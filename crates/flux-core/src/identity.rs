//! Identity types for records and workspaces

use crate::value::leading_int;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a persisted record row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Uid(pub u64);

impl Uid {
    /// Create a new uid
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Interpret a host integer as a uid; zero and negatives are "no record"
    pub fn from_int(value: i64) -> Option<Self> {
        (value > 0).then_some(Self(value as u64))
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a draft workspace; 0 is the live workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WorkspaceId(pub u64);

impl WorkspaceId {
    /// The live (non-draft) workspace
    pub const LIVE: WorkspaceId = WorkspaceId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Whether this is a draft workspace
    pub fn is_draft(&self) -> bool {
        self.0 != 0
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ws:{}", self.0)
    }
}

/// A record id as handed to a hook: either a real uid or a `NEW...`
/// token the host assigned to a record created in the same batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordId {
    Uid(Uid),
    New(String),
}

impl RecordId {
    /// Parse a host id string
    ///
    /// Anything containing `NEW` is a placeholder token; everything else is
    /// cast to an integer, so garbage becomes uid-less.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.contains("NEW") {
            return Some(RecordId::New(raw.to_string()));
        }
        Uid::from_int(leading_int(raw)).map(RecordId::Uid)
    }

    /// The uid, if this id is not a placeholder token
    pub fn as_uid(&self) -> Option<Uid> {
        match self {
            RecordId::Uid(uid) => Some(*uid),
            RecordId::New(_) => None,
        }
    }

    /// Check if this is a placeholder token
    pub fn is_new(&self) -> bool {
        matches!(self, RecordId::New(_))
    }
}

impl From<Uid> for RecordId {
    fn from(uid: Uid) -> Self {
        RecordId::Uid(uid)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Uid(uid) => write!(f, "{}", uid),
            RecordId::New(token) => write!(f, "{}", token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid() {
        let id = Uid::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "42");
        assert_eq!(Uid::from_int(0), None);
        assert_eq!(Uid::from_int(-3), None);
    }

    #[test]
    fn test_record_id_parse() {
        assert_eq!(RecordId::parse("12"), Some(RecordId::Uid(Uid(12))));
        assert_eq!(
            RecordId::parse("NEW5f1a"),
            Some(RecordId::New("NEW5f1a".to_string()))
        );
        assert_eq!(RecordId::parse("0"), None);
        assert_eq!(RecordId::parse("abc"), None);
        assert!(RecordId::parse("NEW1").is_some_and(|id| id.is_new()));
    }

    #[test]
    fn test_workspace() {
        assert!(!WorkspaceId::LIVE.is_draft());
        assert!(WorkspaceId::new(3).is_draft());
    }
}
