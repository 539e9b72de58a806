//! Core traits for sortable records and peer queries
//!
//! These two traits are the whole boundary between the sequencing engine and
//! its collaborators:
//!
//! - `SortableRecord` is implemented by the record type. It exposes identity,
//!   scope attribute values, dirty tracking and the mutable position field.
//! - `PeerQuery` is implemented by a store transaction. Every method runs
//!   inside that transaction, so a failure anywhere rolls back with it.

use crate::error::Result;
use crate::types::{RecordId, ScopeFilter};
use crate::update::PositionUpdate;
use crate::value::Value;

/// A record whose position is maintained within its peer group
pub trait SortableRecord: Clone {
    /// Store identity; `None` until the record is first persisted
    fn record_id(&self) -> Option<RecordId>;

    /// Current (possibly unsaved) value of a scope attribute
    fn scope_value(&self, attribute: &str) -> Value;

    /// True when `attribute` differs from its last-persisted value
    ///
    /// A record that has never been persisted has no last-persisted value and
    /// reports `false`.
    fn scope_changed(&self, attribute: &str) -> bool;

    /// Current position, `None` if unset
    fn position(&self) -> Option<i64>;

    /// Overwrite the in-memory position
    fn set_position(&mut self, position: i64);

    /// True when the position differs from its last-persisted value
    fn position_changed(&self) -> bool;

    /// Treat the current position as persisted
    fn clear_position_change(&mut self);

    /// True when both records refer to the same persisted row
    fn is_same_record(&self, other: &Self) -> bool {
        match (self.record_id(), other.record_id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Peer-group queries executed inside a caller-supplied transaction
///
/// Every method that returns records returns them ascending by position.
/// That ordering is part of the contract: callers never re-sort.
pub trait PeerQuery {
    /// Record type the store materializes
    type Record: SortableRecord;

    /// All rows matching `filter`, ascending by position
    fn select_peers(&mut self, filter: &ScopeFilter) -> Result<Vec<Self::Record>>;

    /// Largest position among rows matching `filter`, `None` for an empty group
    fn max_position(&mut self, filter: &ScopeFilter) -> Result<Option<i64>>;

    /// The row with the smallest position strictly greater than `position`
    fn first_after(&mut self, filter: &ScopeFilter, position: i64)
        -> Result<Option<Self::Record>>;

    /// The row with the largest position strictly less than `position`
    fn last_before(&mut self, filter: &ScopeFilter, position: i64)
        -> Result<Option<Self::Record>>;

    /// Apply one bulk position update as a single statement
    ///
    /// Returns the number of rows the statement matched.
    fn update_positions(&mut self, filter: &ScopeFilter, update: &PositionUpdate)
        -> Result<usize>;
}
