//! Move coordination
//!
//! Every move, whether it comes from a clipboard paste or from a direct
//! move hook, runs the same procedure:
//! 1. the caller resolves the operative row (live row or move placeholder)
//! 2. clipboard overrides are merged into it
//! 3. the new placement is computed without persisting
//! 4. moves that can introduce a parent pass the cycle guard; a cycle
//!    aborts the command with a flash message
//! 5. the placement is persisted to the operative row
//! 6. the most recent workspace version of the original record receives
//!    the same placement

use crate::placement::{MoveTarget, Placement, Proposal};
use crate::tree_guard::TreeGuard;
use crate::version::VersionResolver;
use crate::{EngineConfig, Result};
use flux_core::{
    fields, ClipboardContext, CommandVerb, Error as CoreError, Fields, FlashMessage,
    OperationContext, Record, RecordStore, Uid,
};
use tracing::{debug, info, warn};

const SIBLING_FIELDS: &[&str] = &[
    fields::UID,
    fields::PARENT,
    fields::COLUMN,
    fields::COL_POS,
    fields::SORTING,
];

/// One move as requested by the host
#[derive(Debug, Clone, Copy)]
pub struct MoveRequest<'r> {
    pub table: &'r str,
    /// Key of the command in the host's command map
    pub uid: Uid,
    pub verb: &'r CommandVerb,
    pub target: MoveTarget,
    pub clipboard: &'r ClipboardContext,
}

/// What a move did
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Moved(MoveReport),
    /// The move would have made the record its own descendant; nothing
    /// was persisted and the pending command was removed
    Rejected,
}

/// Rows written by a successful move
#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    /// The operative row with its new placement
    pub record: Record,
    pub placement: Placement,
    /// The workspace version updated alongside, if any
    pub version: Option<Record>,
    /// Whether the cycle guard ran
    pub guarded: bool,
}

impl MoveOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, MoveOutcome::Rejected)
    }

    pub fn report(&self) -> Option<&MoveReport> {
        match self {
            MoveOutcome::Moved(report) => Some(report),
            MoveOutcome::Rejected => None,
        }
    }
}

/// Orchestrates moves across live rows, placeholders and versions
pub struct MoveCoordinator<'a, S> {
    store: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: RecordStore> MoveCoordinator<'a, S> {
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Compute where `record` ends up for `target`, without persisting
    ///
    /// - after a sibling: parent, column and page column of the sibling,
    ///   sorted directly behind it
    /// - into a column with an area reference that nests the record:
    ///   parent and column from the reference
    /// - into the container column: parent and column stay
    /// - into any other column: top level of that column
    ///
    /// Column moves keep the record's sorting. A record with a parent
    /// always sits in the container column.
    pub fn propose(
        &self,
        table: &str,
        record: &Record,
        target: MoveTarget,
        clipboard: &ClipboardContext,
    ) -> Result<Proposal> {
        let mut placement = Placement::of(record);
        let mut needs_guard = false;

        match target {
            MoveTarget::After(sibling) => {
                needs_guard = true;
                match self.store.fetch(table, sibling, Fields::Only(SIBLING_FIELDS))? {
                    Some(row) => {
                        placement.parent = row.parent();
                        placement.column = row.column();
                        placement.col_pos = row.col_pos();
                        placement.sorting = row.sorting() + 1;
                    }
                    None => debug!(table, %sibling, "move target sibling not found; placement kept"),
                }
            }
            MoveTarget::Column(col_pos) => match clipboard.area_reference() {
                Some(reference) => match reference.nested {
                    Some((parent, area)) => {
                        needs_guard = true;
                        placement.parent = Some(parent);
                        placement.column = area;
                    }
                    None => self.place_in_column(&mut placement, reference.col_pos),
                },
                None => self.place_in_column(&mut placement, col_pos),
            },
        }

        if placement.parent.is_some() {
            placement.col_pos = self.config.container_col_pos;
        }

        let mut proposed = record.clone();
        placement.apply_to(&mut proposed);
        Ok(Proposal {
            record: proposed,
            placement,
            needs_guard,
        })
    }

    fn place_in_column(&self, placement: &mut Placement, col_pos: i64) {
        if col_pos != self.config.container_col_pos {
            placement.detach(col_pos);
        }
    }

    /// Merge overrides, compute the placement and run the cycle guard
    ///
    /// The guard runs for every target that can introduce a parent and for
    /// any move whose proposed parent differs from the record's current one.
    /// Nothing is persisted. Returns `None` when the move was rejected; the
    /// flash message is queued and the pending command removed.
    pub fn validate(
        &self,
        request: &MoveRequest<'_>,
        mut record: Record,
        ctx: &mut OperationContext,
    ) -> Result<Option<Proposal>> {
        let table = request.table;
        let current_parent = record.parent();
        record.merge(&request.clipboard.overrides);
        let uid = record.uid().ok_or_else(|| {
            CoreError::InvalidRecordId(format!("{} record to move has no uid", table))
        })?;

        let mut proposal = self.propose(table, &record, request.target, request.clipboard)?;
        // Overrides can hand a column move a new parent
        if proposal.placement.parent.is_some() && proposal.placement.parent != current_parent {
            proposal.needs_guard = true;
        }
        if proposal.needs_guard {
            let guard = TreeGuard::new(self.store, self.config.max_ancestor_depth);
            if guard.would_create_cycle(table, &proposal.record, proposal.placement.parent)? {
                self.reject(request, uid, ctx);
                return Ok(None);
            }
        }
        Ok(Some(proposal))
    }

    /// Run the full move procedure on an already resolved operative row
    pub fn relocate(
        &self,
        request: &MoveRequest<'_>,
        record: Record,
        ctx: &mut OperationContext,
    ) -> Result<MoveOutcome> {
        let table = request.table;
        let Some(proposal) = self.validate(request, record, ctx)? else {
            return Ok(MoveOutcome::Rejected);
        };
        let uid = proposal.record.uid().ok_or_else(|| {
            CoreError::InvalidRecordId(format!("{} record to move has no uid", table))
        })?;

        let changes = proposal.placement.to_record();
        self.store.update(table, uid, &changes)?;
        info!(
            table,
            %uid,
            parent = ?proposal.placement.parent,
            column = %proposal.placement.column,
            sorting = proposal.placement.sorting,
            "record moved"
        );

        let versions = VersionResolver::new(self.store);
        let original = match proposal.record.move_id() {
            Some(shadowed) => shadowed,
            None => versions.resolve_original_id(table, uid)?,
        };
        let mut version = versions.most_recent_version(table, original, ctx)?;
        if let Some(row) = version.as_mut() {
            match row.uid() {
                Some(version_uid) if version_uid != uid => {
                    proposal.placement.apply_to(row);
                    self.store.update(table, version_uid, &changes)?;
                    debug!(table, %original, %version_uid, "workspace version follows move");
                }
                _ => version = None,
            }
        }

        Ok(MoveOutcome::Moved(MoveReport {
            record: proposal.record,
            placement: proposal.placement,
            version,
            guarded: proposal.needs_guard,
        }))
    }

    fn reject(&self, request: &MoveRequest<'_>, uid: Uid, ctx: &mut OperationContext) {
        warn!(
            table = request.table,
            %uid,
            command = %request.verb,
            "move into own subtree refused"
        );
        ctx.enqueue_message(FlashMessage::error(
            format!("Error during {}", request.verb),
            format!(
                "Attempt to move record {}:{} into a column of a child of itself. Move aborted.",
                request.table, request.uid
            ),
        ));
        ctx.remove_pending_command(request.table, request.uid);
    }
}
