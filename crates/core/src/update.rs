//! Bulk position updates
//!
//! A `PositionUpdate` describes one statement of the form
//! `UPDATE .. SET position = <assignment> WHERE <scope> AND <selection>`.
//! Stores execute it as a unit; the renumbering protocols in the engine are
//! built from exactly two of these per operation.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{OrdinalError, Result};

/// Which rows of the peer group a bulk update touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionSelection {
    /// Every row in the group
    All,
    /// Rows with `position >= n`
    AtLeast(i64),
    /// Rows with `position < 0`
    Negative,
}

impl PositionSelection {
    /// True if a row at `position` is selected
    pub fn matches(&self, position: i64) -> bool {
        match self {
            PositionSelection::All => true,
            PositionSelection::AtLeast(n) => position >= *n,
            PositionSelection::Negative => position < 0,
        }
    }
}

/// New value computed for each selected row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionAssignment {
    /// `position := -(position + 1)`
    NegateSuccessor,
    /// `position := -position`
    Negate,
    /// `position := CASE position WHEN old THEN new .. ELSE position END`
    Remap(BTreeMap<i64, i64>),
}

impl PositionAssignment {
    /// Value a row currently at `position` is assigned, `None` on overflow
    pub fn apply(&self, position: i64) -> Option<i64> {
        match self {
            PositionAssignment::NegateSuccessor => position.checked_add(1)?.checked_neg(),
            PositionAssignment::Negate => position.checked_neg(),
            PositionAssignment::Remap(map) => Some(map.get(&position).copied().unwrap_or(position)),
        }
    }
}

/// One bulk update statement over a peer group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionUpdate {
    /// Rows touched
    pub selection: PositionSelection,
    /// Value written to each touched row
    pub assignment: PositionAssignment,
}

impl PositionUpdate {
    /// Move every row at or above `from` to `-(position + 1)`
    pub fn relocate_from(from: i64) -> Self {
        Self {
            selection: PositionSelection::AtLeast(from),
            assignment: PositionAssignment::NegateSuccessor,
        }
    }

    /// Flip every negative position back to positive
    pub fn flip_negatives() -> Self {
        Self {
            selection: PositionSelection::Negative,
            assignment: PositionAssignment::Negate,
        }
    }

    /// Rewrite every row through an explicit old -> new mapping
    pub fn remap(mapping: BTreeMap<i64, i64>) -> Self {
        Self {
            selection: PositionSelection::All,
            assignment: PositionAssignment::Remap(mapping),
        }
    }

    /// New position for a row at `position`, or `None` if not selected
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the new value does not fit in an `i64`,
    /// which happens when a row at `i64::MAX` would have to move up.
    pub fn target(&self, position: i64) -> Result<Option<i64>> {
        if !self.selection.matches(position) {
            return Ok(None);
        }
        self.assignment.apply(position).map(Some).ok_or_else(|| {
            OrdinalError::invalid_input(format!(
                "position {} cannot be moved by `{}`: out of range",
                position, self
            ))
        })
    }
}

impl fmt::Display for PositionUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.assignment {
            PositionAssignment::NegateSuccessor => write!(f, "SET p = -(p + 1)")?,
            PositionAssignment::Negate => write!(f, "SET p = -p")?,
            PositionAssignment::Remap(map) => {
                write!(f, "SET p = CASE p")?;
                for (old, new) in map {
                    write!(f, " WHEN {} THEN {}", old, new)?;
                }
                write!(f, " ELSE p END")?;
            }
        }
        match self.selection {
            PositionSelection::All => Ok(()),
            PositionSelection::AtLeast(n) => write!(f, " WHERE p >= {}", n),
            PositionSelection::Negative => write!(f, " WHERE p < 0"),
        }
    }
}
