//! Engine Configuration - table names, column numbers and safety limits
//!
//! Every field has a default matching the stock content table setup, so an
//! empty RON document `()` is a valid configuration.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for the tree-consistency engine
///
/// # Example
///
/// ```
/// use flux_engine::EngineConfig;
///
/// let config = EngineConfig::from_ron_str("(max_ancestor_depth: 64)").unwrap();
/// assert_eq!(config.max_ancestor_depth, 64);
/// assert_eq!(config.content_table, "tt_content");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Table holding nestable content records
    #[serde(default = "default_content_table")]
    pub content_table: String,

    /// Page column number marking a record as nested inside a container
    #[serde(default = "default_container_col_pos")]
    pub container_col_pos: i64,

    /// Upper bound on ancestors walked by the cycle guard
    ///
    /// A chain longer than this can only come from corrupted data; the
    /// guard then rejects the move.
    #[serde(default = "default_max_ancestor_depth")]
    pub max_ancestor_depth: usize,

    /// Remote procedure name of a drag-and-drop move request
    #[serde(default = "default_move_method")]
    pub move_method: String,

    /// Field naming the record type, used to match providers
    #[serde(default = "default_record_type_field")]
    pub record_type_field: String,
}

fn default_content_table() -> String {
    "tt_content".to_string()
}

fn default_container_col_pos() -> i64 {
    18181
}

fn default_max_ancestor_depth() -> usize {
    10_000
}

fn default_move_method() -> String {
    "moveContentElement".to_string()
}

fn default_record_type_field() -> String {
    "CType".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            content_table: default_content_table(),
            container_col_pos: default_container_col_pos(),
            max_ancestor_depth: default_max_ancestor_depth(),
            move_method: default_move_method(),
            record_type_field: default_record_type_field(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from RON text
    pub fn from_ron_str(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Load a configuration from a RON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Whether `table` is the content table the move hooks act on
    pub fn is_content_table(&self, table: &str) -> bool {
        self.content_table == table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.content_table, "tt_content");
        assert_eq!(config.container_col_pos, 18181);
        assert_eq!(config.move_method, "moveContentElement");
        assert!(config.is_content_table("tt_content"));
        assert!(!config.is_content_table("pages"));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_ron_str("()").expect("parse");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_ron_str(
            r#"(content_table: "tx_news_domain_model_news", container_col_pos: 42)"#,
        )
        .expect("parse");
        assert_eq!(config.content_table, "tx_news_domain_model_news");
        assert_eq!(config.container_col_pos, 42);
        assert_eq!(config.record_type_field, "CType");
    }

    #[test]
    fn test_invalid_document() {
        let error = EngineConfig::from_ron_str("(max_ancestor_depth: \"deep\")").unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let error = EngineConfig::load_file("/nonexistent/flux.ron").unwrap_err();
        assert!(matches!(error, Error::Io(_)));
    }
}
