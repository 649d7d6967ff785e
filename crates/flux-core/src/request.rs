//! Incoming request payloads that steer move operations
//!
//! The host hands over three things this crate cares about:
//! - the clipboard command (`CB`) of a paste operation
//! - request parameters (`data`, `defVals`, `overrideVals`)
//! - the raw request body of an AJAX drag-and-drop move

use crate::{Uid, Value, ValueMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Clipboard command sent with a paste
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipboardCommand {
    /// Paste target, e.g. `tt_content|-12`
    #[serde(default)]
    pub paste: Option<String>,
    /// Field overrides applied to the pasted record
    #[serde(default)]
    pub update: ValueMap,
}

impl ClipboardCommand {
    pub fn is_empty(&self) -> bool {
        self.paste.as_deref().is_none_or(str::is_empty) && self.update.is_empty()
    }

    /// Turn the command into move context for records of `table`
    ///
    /// A paste whose target starts with `<table>|` contributes its split
    /// parameters and its field overrides. Any other non-empty command
    /// yields empty parameters and no overrides.
    pub fn context_for(&self, table: &str) -> Option<ClipboardContext> {
        if self.is_empty() {
            return None;
        }
        let prefix = format!("{}|", table);
        match self.paste.as_deref() {
            Some(paste) if paste.starts_with(&prefix) => Some(ClipboardContext {
                parameters: split_trimmed(paste, '|'),
                overrides: self.update.clone(),
            }),
            _ => Some(ClipboardContext::default()),
        }
    }
}

/// Parameters and field overrides carried into a move
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipboardContext {
    /// Positional move parameters; the second one may be an area reference
    pub parameters: Vec<String>,
    /// Field values merged into the record before the move is computed
    pub overrides: ValueMap,
}

impl ClipboardContext {
    /// Context carrying only move parameters
    pub fn from_parameters(parameters: Vec<String>) -> Self {
        Self {
            parameters,
            overrides: ValueMap::new(),
        }
    }

    /// The area reference in the second parameter, if it is one
    pub fn area_reference(&self) -> Option<AreaReference> {
        self.parameters
            .get(1)
            .and_then(|raw| AreaReference::parse(raw))
    }
}

/// A drop zone reference as produced by the page module:
/// `colpos-<col>-page-<pid>-<x>-<y>-<position>-<relativeUid>-<area>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaReference {
    pub col_pos: i64,
    /// Parent and area name when the drop nests into a container column
    pub nested: Option<(Uid, String)>,
}

impl AreaReference {
    pub fn parse(raw: &str) -> Option<Self> {
        let parts = split_trimmed(raw, '-');
        let part = |index: usize| parts.get(index).map(String::as_str).unwrap_or("");
        if part(0) != "colpos" || part(2) != "page" {
            return None;
        }
        let col_pos = Value::from(part(1)).to_int();
        let nested = match (part(6), Uid::from_int(Value::from(part(7)).to_int())) {
            ("top", Some(parent)) => Some((parent, part(8).to_string())),
            _ => None,
        };
        Some(Self { col_pos, nested })
    }
}

/// JSON body of an AJAX request
#[derive(Debug, Deserialize)]
struct RemoteCall {
    method: Option<String>,
    data: Option<serde_json::Value>,
}

/// Extract the move payload from a raw request body
///
/// Only a call to `method` with a `data` member counts; anything else,
/// including malformed JSON, carries no move data.
pub fn parse_move_data(raw_body: &str, method: &str) -> Option<Vec<String>> {
    if raw_body.trim().is_empty() {
        return None;
    }
    let call: RemoteCall = match serde_json::from_str(raw_body) {
        Ok(call) => call,
        Err(error) => {
            tracing::debug!(%error, "request body is not a remote call");
            return None;
        }
    };
    if call.method.as_deref() != Some(method) {
        return None;
    }
    let data = call.data?;
    let parameters = match data {
        serde_json::Value::Array(items) => items.into_iter().map(json_text).collect(),
        serde_json::Value::Object(members) => members.into_values().map(json_text).collect(),
        other => vec![json_text(other)],
    };
    Some(parameters)
}

fn json_text(value: serde_json::Value) -> String {
    Value::from(value).to_text()
}

fn split_trimmed(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(|part| part.trim().to_string())
        .collect()
}

/// Per-table, per-record field values from request parameters
pub type RecordFieldMap = IndexMap<String, IndexMap<Uid, ValueMap>>;

/// The parts of the incoming request visible to the hooks
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Clipboard command (`CB`)
    pub clipboard: Option<ClipboardCommand>,
    /// Submitted field values (`data[table][uid][field]`)
    pub data: RecordFieldMap,
    /// Defaults for new records (`defVals[table][field]` and `overrideVals`)
    pub new_record_defaults: IndexMap<String, ValueMap>,
    /// Raw request body
    pub raw_body: Option<String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clipboard(mut self, clipboard: ClipboardCommand) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    /// Record a submitted field value
    pub fn with_data(
        mut self,
        table: &str,
        uid: Uid,
        field: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.data
            .entry(table.to_string())
            .or_default()
            .entry(uid)
            .or_default()
            .insert(field.to_string(), value.into());
        self
    }

    /// Record a default for new records of `table`
    pub fn with_new_record_default(
        mut self,
        table: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.new_record_defaults
            .entry(table.to_string())
            .or_default()
            .insert(field.to_string(), value.into());
        self
    }

    /// Clipboard move context for records of `table`
    pub fn clipboard_context(&self, table: &str) -> Option<ClipboardContext> {
        self.clipboard
            .as_ref()
            .and_then(|command| command.context_for(table))
    }

    /// Submitted field value for one record
    pub fn submitted(&self, table: &str, uid: Uid, field: &str) -> Option<&Value> {
        self.data.get(table)?.get(&uid)?.get(field)
    }

    /// Defaults for new records of `table`
    pub fn new_record_defaults(&self, table: &str) -> Option<&ValueMap> {
        self.new_record_defaults.get(table)
    }

    /// Move parameters of an AJAX move call, if this request is one
    pub fn move_data(&self, method: &str) -> Option<Vec<String>> {
        self.raw_body
            .as_deref()
            .and_then(|body| parse_move_data(body, method))
    }
}
