//! Operation context threaded through every hook call
//!
//! Stands in for the host's record-editing engine instance, exposing only
//! what the hooks need: the pending command map, NEW-id substitutions,
//! copy mappings, the active workspace, the flash message queue and the
//! incoming request.

use crate::{FlashMessage, RecordId, Request, Uid, WorkspaceId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Verb of a command-map entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandVerb {
    Copy,
    Move,
    Delete,
    Undelete,
    Localize,
    Version,
    Other(String),
}

impl CommandVerb {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "copy" => CommandVerb::Copy,
            "move" => CommandVerb::Move,
            "delete" => CommandVerb::Delete,
            "undelete" => CommandVerb::Undelete,
            "localize" => CommandVerb::Localize,
            "version" => CommandVerb::Version,
            other => CommandVerb::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CommandVerb::Copy => "copy",
            CommandVerb::Move => "move",
            CommandVerb::Delete => "delete",
            CommandVerb::Undelete => "undelete",
            CommandVerb::Localize => "localize",
            CommandVerb::Version => "version",
            CommandVerb::Other(raw) => raw,
        }
    }

    /// Copy and move are the verbs that relocate a record
    pub fn relocates(&self) -> bool {
        matches!(self, CommandVerb::Copy | CommandVerb::Move)
    }
}

impl fmt::Display for CommandVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a datamap operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    New,
    Update,
}

impl RecordStatus {
    pub fn parse(raw: &str) -> Self {
        if raw == "new" {
            RecordStatus::New
        } else {
            RecordStatus::Update
        }
    }
}

/// A command waiting in the host's command map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub verb: CommandVerb,
    /// Target value; negative means "after the record with this uid"
    pub target: i64,
}

/// A provider failure recorded during the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: String,
    pub table: String,
    pub message: String,
}

/// Request-scoped state shared between the host and the hooks
#[derive(Debug, Default)]
pub struct OperationContext {
    workspace: WorkspaceId,
    commands: IndexMap<String, IndexMap<Uid, PendingCommand>>,
    substitutions: HashMap<String, Uid>,
    copies: IndexMap<String, HashMap<Uid, Uid>>,
    messages: Vec<FlashMessage>,
    failures: Vec<ProviderFailure>,
    request: Request,
}

impl OperationContext {
    /// Create a context for the live workspace with an empty request
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(mut self, workspace: WorkspaceId) -> Self {
        self.workspace = workspace;
        self
    }

    pub fn with_request(mut self, request: Request) -> Self {
        self.request = request;
        self
    }

    pub fn workspace(&self) -> WorkspaceId {
        self.workspace
    }

    /// Whether the editor works inside a draft workspace
    pub fn in_draft_workspace(&self) -> bool {
        self.workspace.is_draft()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Queue a command as the host does before processing the command map
    pub fn queue_command(&mut self, table: &str, uid: Uid, verb: CommandVerb, target: i64) {
        self.commands
            .entry(table.to_string())
            .or_default()
            .insert(uid, PendingCommand { verb, target });
    }

    pub fn pending_command(&self, table: &str, uid: Uid) -> Option<&PendingCommand> {
        self.commands.get(table)?.get(&uid)
    }

    /// Drop a pending command so the host does not process it
    pub fn remove_pending_command(&mut self, table: &str, uid: Uid) -> Option<PendingCommand> {
        self.commands.get_mut(table)?.shift_remove(&uid)
    }

    /// Register the uid the host assigned to a NEW token
    pub fn map_new_id(&mut self, token: impl Into<String>, uid: Uid) {
        self.substitutions.insert(token.into(), uid);
    }

    pub fn substituted_id(&self, token: &str) -> Option<Uid> {
        self.substitutions.get(token).copied()
    }

    /// Resolve a hook id to a uid, substituting NEW tokens when known
    pub fn resolve_uid(&self, id: &RecordId) -> Option<Uid> {
        match id {
            RecordId::Uid(uid) => Some(*uid),
            RecordId::New(token) => self.substituted_id(token),
        }
    }

    /// Register the copy created from `original`
    pub fn map_copy(&mut self, table: &str, original: Uid, copy: Uid) {
        self.copies
            .entry(table.to_string())
            .or_default()
            .insert(original, copy);
    }

    pub fn copy_of(&self, table: &str, original: Uid) -> Option<Uid> {
        self.copies.get(table)?.get(&original).copied()
    }

    pub fn enqueue_message(&mut self, message: FlashMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[FlashMessage] {
        &self.messages
    }

    pub fn record_failure(&mut self, failure: ProviderFailure) {
        self.failures.push(failure);
    }

    pub fn failures(&self) -> &[ProviderFailure] {
        &self.failures
    }
}
