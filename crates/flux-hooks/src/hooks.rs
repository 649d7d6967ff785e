//! Entry points called by the host's record-editing engine
//!
//! Each method maps one host hook onto the engine. The move hooks only
//! act on the configured content table; provider dispatch runs for every
//! table.

use crate::Result;
use flux_core::{
    fields, ClipboardContext, CommandVerb, OperationContext, Record, RecordId, RecordStatus,
    RecordStore, Uid,
};
use flux_engine::{
    CacheCommand, CacheSweep, CommandArguments, Engine, Lifecycle, MoveOutcome, MoveRequest,
    MoveTarget, ProviderRegistry,
};
use tracing::debug;

/// What the host should do with a command after the pre-process hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Proceed,
    /// The command was refused and removed from the pending commands
    Cancelled,
}

/// The hook object registered with the host
pub struct HookEntryPoints<S, R> {
    engine: Engine<S, R>,
    caches: CacheSweep,
}

impl<S: RecordStore, R: ProviderRegistry> HookEntryPoints<S, R> {
    pub fn new(engine: Engine<S, R>) -> Self {
        Self {
            engine,
            caches: CacheSweep::new(),
        }
    }

    pub fn engine(&self) -> &Engine<S, R> {
        &self.engine
    }

    pub fn caches(&self) -> &CacheSweep {
        &self.caches
    }

    fn is_content(&self, table: &str) -> bool {
        self.engine.config().is_content_table(table)
    }

    /// Record the command's move will act on: the copy for copies, the
    /// original otherwise, either resolved to its move placeholder
    fn command_record(
        &self,
        verb: &CommandVerb,
        table: &str,
        uid: Uid,
        ctx: &OperationContext,
    ) -> Result<Option<Record>> {
        let subject = match verb {
            CommandVerb::Copy => match ctx.copy_of(table, uid) {
                Some(copy) => copy,
                None => {
                    debug!(table, %uid, "copy not created yet; nothing to place");
                    return Ok(None);
                }
            },
            _ => uid,
        };
        let record = self
            .engine
            .versions()
            .resolve_operative_record(table, subject, ctx)?;
        Ok(Some(record))
    }

    fn dispatch_command(
        &self,
        lifecycle: &mut Lifecycle,
        table: &str,
        id: &RecordId,
        record: Record,
        ctx: &mut OperationContext,
    ) -> Result<i64> {
        self.engine
            .dispatcher()
            .dispatch(lifecycle, table, id, record, ctx)?;
        Ok(lifecycle
            .command()
            .map(|args| args.relative_to)
            .unwrap_or_default())
    }

    /// Before the host runs a command
    ///
    /// A clipboard paste that moves a content record is checked against
    /// the cycle guard first. A refused move is cancelled without calling
    /// providers. `relative_to` may be rewritten by providers.
    pub fn process_cmdmap_pre_process(
        &self,
        verb: &CommandVerb,
        table: &str,
        id: &RecordId,
        relative_to: &mut i64,
        ctx: &mut OperationContext,
    ) -> Result<Disposition> {
        let uid = ctx.resolve_uid(id);
        let mut record = match uid {
            Some(uid) => self
                .engine
                .versions()
                .resolve_operative_record(table, uid, ctx)?,
            None => Record::new(),
        };

        let clipboard = ctx.request().clipboard_context(table);
        if let (Some(uid), Some(clipboard)) = (uid, clipboard) {
            if self.is_content(table) && verb.relocates() {
                if let Some(subject) = self.command_record(verb, table, uid, ctx)? {
                    record = subject;
                }
                if *verb == CommandVerb::Move {
                    let target = MoveTarget::for_paste(*relative_to, &record, &clipboard);
                    let request = MoveRequest {
                        table,
                        uid,
                        verb,
                        target,
                        clipboard: &clipboard,
                    };
                    let checked = self
                        .engine
                        .coordinator()
                        .validate(&request, record.clone(), ctx)?;
                    if checked.is_none() {
                        return Ok(Disposition::Cancelled);
                    }
                }
            }
        }

        let mut lifecycle = Lifecycle::PreProcessCommand(CommandArguments {
            verb: verb.clone(),
            relative_to: *relative_to,
        });
        *relative_to = self.dispatch_command(&mut lifecycle, table, id, record, ctx)?;
        Ok(Disposition::Proceed)
    }

    /// After the host ran a command
    ///
    /// Clipboard copies and moves of content records do not reach the
    /// move hooks, so their placement is applied here, to the live row
    /// and to its workspace version.
    pub fn process_cmdmap_post_process(
        &self,
        verb: &CommandVerb,
        table: &str,
        id: &RecordId,
        relative_to: &mut i64,
        ctx: &mut OperationContext,
    ) -> Result<()> {
        let uid = ctx.resolve_uid(id);
        let mut record = match uid {
            Some(uid) => self
                .engine
                .versions()
                .resolve_operative_record(table, uid, ctx)?,
            None => Record::new(),
        };

        if self.is_content(table) {
            if *verb == CommandVerb::Localize {
                debug!(table, %id, "localize is left to providers");
            }
            let clipboard = ctx.request().clipboard_context(table);
            if let (Some(uid), Some(clipboard)) = (uid, clipboard) {
                if verb.relocates() {
                    if let Some(subject) = self.command_record(verb, table, uid, ctx)? {
                        let target = MoveTarget::for_paste(*relative_to, &subject, &clipboard);
                        let request = MoveRequest {
                            table,
                            uid,
                            verb,
                            target,
                            clipboard: &clipboard,
                        };
                        match self.engine.coordinator().relocate(&request, subject, ctx)? {
                            MoveOutcome::Moved(report) => record = report.record,
                            MoveOutcome::Rejected => return Ok(()),
                        }
                    }
                }
            }
        }

        let mut lifecycle = Lifecycle::PostProcessCommand(CommandArguments {
            verb: verb.clone(),
            relative_to: *relative_to,
        });
        *relative_to = self.dispatch_command(&mut lifecycle, table, id, record, ctx)?;
        Ok(())
    }

    /// Before the host processes submitted fields
    ///
    /// New content records take their container position from the
    /// request's new-record defaults.
    pub fn process_datamap_pre_process_field_array(
        &self,
        incoming: &mut Record,
        table: &str,
        id: &RecordId,
        ctx: &mut OperationContext,
    ) -> Result<()> {
        if id.is_new() && self.is_content(table) {
            if let Some(defaults) = ctx.request().new_record_defaults(table) {
                for name in [fields::PARENT, fields::COLUMN] {
                    if let Some(value) = defaults.get(name) {
                        incoming.set(name, value.clone());
                    }
                }
                if incoming.parent().is_some() {
                    incoming.set_col_pos(self.engine.config().container_col_pos);
                }
            }
        }

        let record = std::mem::take(incoming);
        *incoming = self.engine.dispatcher().dispatch(
            &mut Lifecycle::PreProcessRecord,
            table,
            id,
            record,
            ctx,
        )?;
        Ok(())
    }

    /// After the host processed submitted fields, before persisting
    pub fn process_datamap_post_process_field_array(
        &self,
        status: RecordStatus,
        table: &str,
        id: &RecordId,
        field_array: &mut Record,
        ctx: &mut OperationContext,
    ) -> Result<()> {
        let record = std::mem::take(field_array);
        *field_array = self.engine.dispatcher().dispatch(
            &mut Lifecycle::PostProcessRecord(status),
            table,
            id,
            record,
            ctx,
        )?;
        Ok(())
    }

    /// After the host persisted a record
    ///
    /// A new content record created inside a container is moved into the
    /// container column.
    pub fn process_datamap_after_database_operations(
        &self,
        status: RecordStatus,
        table: &str,
        id: &RecordId,
        field_array: &mut Record,
        ctx: &mut OperationContext,
    ) -> Result<()> {
        if status == RecordStatus::New && self.is_content(table) && field_array.parent().is_some() {
            if let Some(uid) = ctx.resolve_uid(id) {
                let col_pos = self.engine.config().container_col_pos;
                let mut changes = Record::new();
                changes.set_col_pos(col_pos);
                self.engine.store().update(table, uid, &changes)?;
                field_array.set_col_pos(col_pos);
                debug!(table, %uid, col_pos, "new record placed in container column");
            }
        }

        let record = std::mem::take(field_array);
        *field_array = self.engine.dispatcher().dispatch(
            &mut Lifecycle::PostProcessDatabaseOperation(status),
            table,
            id,
            record,
            ctx,
        )?;
        Ok(())
    }

    /// After the host moved a record to the top of a page column
    ///
    /// The host calls this for the moved record and again for each of its
    /// children. Only the record whose new column was submitted in the
    /// request, keyed by its original uid, is acted on.
    pub fn move_record_first_element_post_process(
        &self,
        table: &str,
        uid: Uid,
        mut row: Record,
        ctx: &mut OperationContext,
    ) -> Result<Option<MoveOutcome>> {
        if !self.is_content(table) {
            return Ok(None);
        }
        let original = self.engine.versions().resolve_original_id(table, uid)?;
        let Some(col_pos) = ctx
            .request()
            .submitted(table, original, fields::COL_POS)
            .map(|value| value.to_int())
        else {
            return Ok(None);
        };

        row.set_uid(uid);
        let clipboard = ClipboardContext::default();
        let verb = CommandVerb::Move;
        let request = MoveRequest {
            table,
            uid,
            verb: &verb,
            target: MoveTarget::Column(col_pos),
            clipboard: &clipboard,
        };
        Ok(Some(self.engine.coordinator().relocate(&request, row, ctx)?))
    }

    /// After the host moved a record behind another one
    ///
    /// On success the computed placement is written back into
    /// `update_fields`; a refused move leaves them as they were.
    pub fn move_record_after_another_element_post_process(
        &self,
        table: &str,
        uid: Uid,
        original_destination: i64,
        update_fields: &mut Record,
        ctx: &mut OperationContext,
    ) -> Result<Option<MoveOutcome>> {
        if !self.is_content(table) {
            return Ok(None);
        }
        let parameters = ctx
            .request()
            .move_data(&self.engine.config().move_method)
            .unwrap_or_default();
        let clipboard = ClipboardContext::from_parameters(parameters);

        let mut record = update_fields.clone();
        record.set_uid(uid);
        let verb = CommandVerb::Move;
        let request = MoveRequest {
            table,
            uid,
            verb: &verb,
            target: MoveTarget::from_relative(original_destination),
            clipboard: &clipboard,
        };
        let outcome = self.engine.coordinator().relocate(&request, record, ctx)?;
        if let MoveOutcome::Moved(report) = &outcome {
            update_fields.set_uid(uid);
            report.placement.apply_to(update_fields);
        }
        Ok(Some(outcome))
    }

    /// The host is clearing caches
    ///
    /// Returns the number of providers asked, or `None` if this process
    /// already swept.
    pub fn clear_cache_command(&self, command: &str) -> Option<usize> {
        self.caches
            .clear(self.engine.registry(), &CacheCommand::parse(command))
    }
}
