//! Configuration providers and their dispatch
//!
//! Providers are plugins matched by table and record type. The hooks call
//! them at fixed lifecycle points with the record being processed; a
//! provider may rewrite that record. A failing provider is logged and
//! recorded on the operation context, and the remaining providers still
//! run.

use crate::cache::CacheCommand;
use crate::Result;
use flux_core::{
    CommandVerb, Fields, OperationContext, ProviderFailure, Record, RecordId, RecordStatus,
    RecordStore, Uid,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// A recoverable provider failure
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Core(#[from] flux_core::Error),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Arguments of a command lifecycle call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArguments {
    pub verb: CommandVerb,
    /// Host "relative to" value; providers may rewrite it
    pub relative_to: i64,
}

/// The record a provider is called for
pub struct Invocation<'a> {
    pub table: &'a str,
    /// Id as the host passed it, possibly a NEW token
    pub id: &'a RecordId,
    /// Numeric id after substitution, if known
    pub uid: Option<Uid>,
    pub record: &'a mut Record,
    pub context: &'a mut OperationContext,
}

/// The lifecycle point a dispatch is made for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    PreProcessCommand(CommandArguments),
    PostProcessCommand(CommandArguments),
    PreProcessRecord,
    PostProcessRecord(RecordStatus),
    PostProcessDatabaseOperation(RecordStatus),
}

impl Lifecycle {
    pub fn name(&self) -> &'static str {
        match self {
            Lifecycle::PreProcessCommand(_) => "pre_process_command",
            Lifecycle::PostProcessCommand(_) => "post_process_command",
            Lifecycle::PreProcessRecord => "pre_process_record",
            Lifecycle::PostProcessRecord(_) => "post_process_record",
            Lifecycle::PostProcessDatabaseOperation(_) => "post_process_database_operation",
        }
    }

    /// Command arguments after dispatch, for commands
    pub fn command(&self) -> Option<&CommandArguments> {
        match self {
            Lifecycle::PreProcessCommand(args) | Lifecycle::PostProcessCommand(args) => Some(args),
            _ => None,
        }
    }
}

/// A plugin reacting to record lifecycle events
///
/// Every callback defaults to doing nothing, so a provider only
/// implements the points it cares about.
pub trait ConfigurationProvider: Send + Sync {
    /// Name used in logs and recorded failures
    fn name(&self) -> &str;

    /// Higher runs first
    fn priority(&self) -> i32 {
        0
    }

    fn pre_process_command(
        &self,
        _args: &mut CommandArguments,
        _call: &mut Invocation<'_>,
    ) -> ProviderResult<()> {
        Ok(())
    }

    fn post_process_command(
        &self,
        _args: &mut CommandArguments,
        _call: &mut Invocation<'_>,
    ) -> ProviderResult<()> {
        Ok(())
    }

    fn pre_process_record(&self, _call: &mut Invocation<'_>) -> ProviderResult<()> {
        Ok(())
    }

    fn post_process_record(
        &self,
        _status: RecordStatus,
        _call: &mut Invocation<'_>,
    ) -> ProviderResult<()> {
        Ok(())
    }

    fn post_process_database_operation(
        &self,
        _status: RecordStatus,
        _call: &mut Invocation<'_>,
    ) -> ProviderResult<()> {
        Ok(())
    }

    fn clear_cache(&self, _command: &CacheCommand) -> ProviderResult<()> {
        Ok(())
    }
}

/// Lookup of providers by table and record
pub trait ProviderRegistry {
    /// Providers for `table`, in call order. Without a record only
    /// providers not bound to a record type match.
    fn resolve(&self, table: &str, record: Option<&Record>) -> Vec<Arc<dyn ConfigurationProvider>>;

    /// Every table with at least one provider
    fn tables(&self) -> Vec<String>;
}

#[derive(Clone)]
struct Registration {
    table: String,
    record_type: Option<String>,
    priority: i32,
    provider: Arc<dyn ConfigurationProvider>,
}

/// In-process provider registry
#[derive(Clone)]
pub struct ProviderSet {
    type_field: String,
    registrations: Vec<Registration>,
}

impl ProviderSet {
    /// Create an empty set matching record types on `type_field`
    pub fn new(type_field: impl Into<String>) -> Self {
        Self {
            type_field: type_field.into(),
            registrations: Vec::new(),
        }
    }

    /// Register a provider for every record of `table`
    pub fn register(&mut self, table: &str, provider: Arc<dyn ConfigurationProvider>) {
        self.push(table, None, provider);
    }

    /// Register a provider for records of `table` whose type field equals
    /// `record_type`
    pub fn register_for_type(
        &mut self,
        table: &str,
        record_type: &str,
        provider: Arc<dyn ConfigurationProvider>,
    ) {
        self.push(table, Some(record_type.to_string()), provider);
    }

    fn push(&mut self, table: &str, record_type: Option<String>, provider: Arc<dyn ConfigurationProvider>) {
        self.registrations.push(Registration {
            table: table.to_string(),
            record_type,
            priority: provider.priority(),
            provider,
        });
        self.registrations
            .sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl ProviderRegistry for ProviderSet {
    fn resolve(&self, table: &str, record: Option<&Record>) -> Vec<Arc<dyn ConfigurationProvider>> {
        let record_type = record
            .and_then(|record| record.get(&self.type_field))
            .map(|value| value.to_text());
        self.registrations
            .iter()
            .filter(|entry| entry.table == table)
            .filter(|entry| match (&entry.record_type, &record_type) {
                (None, _) => true,
                (Some(wanted), Some(actual)) => wanted == actual,
                (Some(_), None) => false,
            })
            .map(|entry| Arc::clone(&entry.provider))
            .collect()
    }

    fn tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        for entry in &self.registrations {
            if !tables.contains(&entry.table) {
                tables.push(entry.table.clone());
            }
        }
        tables
    }
}

/// Invokes the providers matching a record
pub struct ProviderDispatcher<'a, S, R: ?Sized> {
    store: &'a S,
    registry: &'a R,
}

impl<'a, S: RecordStore, R: ProviderRegistry + ?Sized> ProviderDispatcher<'a, S, R> {
    pub fn new(store: &'a S, registry: &'a R) -> Self {
        Self { store, registry }
    }

    /// Call every provider for `table`/`record` at `lifecycle`
    ///
    /// A NEW token id is substituted first. An empty record with a known
    /// uid is reloaded from the store. Returns the record as left by the
    /// providers; only a store failure is an error.
    pub fn dispatch(
        &self,
        lifecycle: &mut Lifecycle,
        table: &str,
        id: &RecordId,
        mut record: Record,
        ctx: &mut OperationContext,
    ) -> Result<Record> {
        let uid = ctx.resolve_uid(id);
        if let Some(uid) = uid.filter(|_| record.is_empty()) {
            if let Some(loaded) = self.store.fetch(table, uid, Fields::All)? {
                debug!(table, %uid, "reloaded empty record for providers");
                record = loaded;
            }
        }

        let providers = self.registry.resolve(table, Some(&record));
        for provider in providers {
            let mut call = Invocation {
                table,
                id,
                uid,
                record: &mut record,
                context: &mut *ctx,
            };
            let outcome = match &mut *lifecycle {
                Lifecycle::PreProcessCommand(args) => provider.pre_process_command(args, &mut call),
                Lifecycle::PostProcessCommand(args) => provider.post_process_command(args, &mut call),
                Lifecycle::PreProcessRecord => provider.pre_process_record(&mut call),
                Lifecycle::PostProcessRecord(status) => provider.post_process_record(*status, &mut call),
                Lifecycle::PostProcessDatabaseOperation(status) => {
                    provider.post_process_database_operation(*status, &mut call)
                }
            };
            if let Err(error) = outcome {
                warn!(
                    provider = provider.name(),
                    table,
                    %id,
                    lifecycle = lifecycle.name(),
                    %error,
                    "configuration provider failed"
                );
                ctx.record_failure(ProviderFailure {
                    provider: provider.name().to_string(),
                    table: table.to_string(),
                    message: error.to_string(),
                });
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_core::{MemoryStore, Value};
    use parking_lot::Mutex;

    const TABLE: &str = "tt_content";

    /// Records the calls it sees and tags the record with its name
    struct Recorder {
        name: String,
        priority: i32,
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn new(name: &str, priority: i32) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                priority,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl ConfigurationProvider for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn pre_process_command(
            &self,
            args: &mut CommandArguments,
            call: &mut Invocation<'_>,
        ) -> ProviderResult<()> {
            self.calls.lock().push(format!("command:{}", args.verb));
            args.relative_to = 77;
            let seen = call.record.get("seen").map(|v| v.to_text()).unwrap_or_default();
            call.record.set("seen", format!("{}{}", seen, self.name));
            Ok(())
        }

        fn pre_process_record(&self, call: &mut Invocation<'_>) -> ProviderResult<()> {
            self.calls
                .lock()
                .push(format!("record:{}", call.uid.map(|uid| uid.raw()).unwrap_or(0)));
            let seen = call.record.get("seen").map(|v| v.to_text()).unwrap_or_default();
            call.record.set("seen", format!("{}{}", seen, self.name));
            Ok(())
        }
    }

    struct Failing;

    impl ConfigurationProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn priority(&self) -> i32 {
            100
        }

        fn pre_process_record(&self, _call: &mut Invocation<'_>) -> ProviderResult<()> {
            Err(ProviderError::Failed("template missing".to_string()))
        }
    }

    fn typed(ctype: &str) -> Record {
        let mut record = Record::with_uid(Uid(1));
        record.set("CType", ctype);
        record
    }

    #[test]
    fn test_set_orders_by_priority() {
        let low = Recorder::new("low", 1);
        let high = Recorder::new("high", 10);
        let mut set = ProviderSet::new("CType");
        set.register(TABLE, low);
        set.register(TABLE, high);
        set.register("pages", Recorder::new("page", 50));

        let names: Vec<String> = set
            .resolve(TABLE, None)
            .iter()
            .map(|provider| provider.name().to_string())
            .collect();
        assert_eq!(names, vec!["high", "low"]);
        assert_eq!(set.tables(), vec!["pages".to_string(), TABLE.to_string()]);
    }

    #[test]
    fn test_set_matches_record_type() {
        let mut set = ProviderSet::new("CType");
        set.register_for_type(TABLE, "flux_grid", Recorder::new("grid", 0));
        set.register(TABLE, Recorder::new("any", 0));

        assert_eq!(set.resolve(TABLE, Some(&typed("flux_grid"))).len(), 2);
        assert_eq!(set.resolve(TABLE, Some(&typed("text"))).len(), 1);
        assert_eq!(set.resolve(TABLE, None).len(), 1);
        assert!(set.resolve("pages", Some(&typed("flux_grid"))).is_empty());
    }

    #[test]
    fn test_dispatch_chains_record_changes() {
        let store = MemoryStore::new();
        let first = Recorder::new("a", 2);
        let second = Recorder::new("b", 1);
        let mut set = ProviderSet::new("CType");
        set.register(TABLE, second.clone());
        set.register(TABLE, first.clone());

        let dispatcher = ProviderDispatcher::new(&store, &set);
        let mut ctx = OperationContext::new();
        let mut lifecycle = Lifecycle::PreProcessCommand(CommandArguments {
            verb: CommandVerb::Move,
            relative_to: 5,
        });

        let record = dispatcher
            .dispatch(&mut lifecycle, TABLE, &RecordId::Uid(Uid(1)), typed("text"), &mut ctx)
            .expect("dispatch");

        assert_eq!(record.get("seen"), Some(&Value::from("ab")));
        assert_eq!(first.calls(), vec!["command:move"]);
        assert_eq!(second.calls(), vec!["command:move"]);
        assert_eq!(lifecycle.command().map(|args| args.relative_to), Some(77));
    }

    #[test]
    fn test_failure_does_not_stop_other_providers() {
        let store = MemoryStore::new();
        let after = Recorder::new("after", 0);
        let mut set = ProviderSet::new("CType");
        set.register(TABLE, Arc::new(Failing));
        set.register(TABLE, after.clone());

        let dispatcher = ProviderDispatcher::new(&store, &set);
        let mut ctx = OperationContext::new();
        let record = dispatcher
            .dispatch(
                &mut Lifecycle::PreProcessRecord,
                TABLE,
                &RecordId::Uid(Uid(4)),
                typed("text"),
                &mut ctx,
            )
            .expect("dispatch");

        assert_eq!(after.calls(), vec!["record:4"]);
        assert_eq!(record.get("seen"), Some(&Value::from("after")));
        assert_eq!(ctx.failures().len(), 1);
        assert_eq!(ctx.failures()[0].provider, "failing");
        assert_eq!(ctx.failures()[0].message, "template missing");
    }

    #[test]
    fn test_new_token_is_substituted_and_record_reloaded() {
        let store = MemoryStore::new();
        let mut stored = typed("text");
        stored.set_uid(Uid(42));
        stored.set("header", "Loaded");
        store.insert(TABLE, stored);

        let recorder = Recorder::new("r", 0);
        let mut set = ProviderSet::new("CType");
        set.register(TABLE, recorder.clone());

        let dispatcher = ProviderDispatcher::new(&store, &set);
        let mut ctx = OperationContext::new();
        ctx.map_new_id("NEW5f3a", Uid(42));

        let id = RecordId::New("NEW5f3a".to_string());
        let record = dispatcher
            .dispatch(&mut Lifecycle::PreProcessRecord, TABLE, &id, Record::new(), &mut ctx)
            .expect("dispatch");

        assert_eq!(recorder.calls(), vec!["record:42"]);
        assert_eq!(record.get("header"), Some(&Value::from("Loaded")));
    }

    #[test]
    fn test_unknown_new_token_stays_empty() {
        let store = MemoryStore::new();
        let recorder = Recorder::new("r", 0);
        let mut set = ProviderSet::new("CType");
        set.register(TABLE, recorder.clone());

        let dispatcher = ProviderDispatcher::new(&store, &set);
        let mut ctx = OperationContext::new();
        let id = RecordId::New("NEW1".to_string());
        dispatcher
            .dispatch(&mut Lifecycle::PreProcessRecord, TABLE, &id, Record::new(), &mut ctx)
            .expect("dispatch");

        assert_eq!(recorder.calls(), vec!["record:0"]);
    }
}
