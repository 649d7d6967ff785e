//! Move targets and the position they resolve to

use flux_core::{fields, ClipboardContext, Record, Uid};

/// Where a record is being moved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// Top of a page column
    Column(i64),
    /// Directly after the sibling with this uid
    After(Uid),
}

impl MoveTarget {
    /// Interpret a host "relative to" value: negative values point at a
    /// sibling, everything else is a column
    pub fn from_relative(value: i64) -> Self {
        if value < 0 {
            MoveTarget::After(Uid(value.unsigned_abs()))
        } else {
            MoveTarget::Column(value)
        }
    }

    /// Target of a clipboard paste
    ///
    /// A positive paste target names a page, not a column, so the column
    /// comes from the clipboard overrides or the record itself.
    pub fn for_paste(relative_to: i64, record: &Record, clipboard: &ClipboardContext) -> Self {
        if relative_to < 0 {
            return Self::from_relative(relative_to);
        }
        let col_pos = clipboard
            .overrides
            .get(fields::COL_POS)
            .map(|value| value.to_int())
            .unwrap_or_else(|| record.col_pos());
        MoveTarget::Column(col_pos)
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, MoveTarget::After(_))
    }
}

/// Position fields of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub parent: Option<Uid>,
    pub column: String,
    pub col_pos: i64,
    pub sorting: i64,
}

impl Placement {
    /// Current placement of a record
    pub fn of(record: &Record) -> Self {
        Self {
            parent: record.parent(),
            column: record.column(),
            col_pos: record.col_pos(),
            sorting: record.sorting(),
        }
    }

    /// Place the record at top level of a page column
    pub fn detach(&mut self, col_pos: i64) {
        self.parent = None;
        self.column.clear();
        self.col_pos = col_pos;
    }

    /// Write this placement into a record
    pub fn apply_to(&self, record: &mut Record) {
        record.set_parent(self.parent);
        record.set_column(self.column.clone());
        record.set_col_pos(self.col_pos);
        record.set_sorting(self.sorting);
    }

    /// The fields a move persists
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        self.apply_to(&mut record);
        record
    }
}

/// A computed, not yet persisted move
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    /// The record with the new placement applied
    pub record: Record,
    pub placement: Placement,
    /// Whether the move can introduce a new parent and must pass the cycle guard
    pub needs_guard: bool,
}
