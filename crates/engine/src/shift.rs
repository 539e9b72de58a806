//! Two-phase negate-swap
//!
//! Moving many rows of a peer group at once under a live unique index is
//! done in exactly two statements:
//!
//! 1. Every affected row moves to a distinct negative value. No positive
//!    slot is claimed, and the negative targets are pairwise distinct, so no
//!    row can land on a slot another row still holds.
//! 2. Every negative row flips sign. The targets are the positive
//!    counterparts of a duplicate-free set, and none of them is held by an
//!    unaffected row.
//!
//! Both statements must run in the same transaction as the write that
//! triggered them.

use std::collections::BTreeMap;

use ordinal_core::{PeerQuery, PositionUpdate, Result, ScopeFilter};

/// Shift every row at or above `at` up by one, leaving `at` free
///
/// Returns the number of rows moved.
pub(crate) fn open_gap<Q: PeerQuery>(query: &mut Q, filter: &ScopeFilter, at: i64) -> Result<usize> {
    let moved = query.update_positions(filter, &PositionUpdate::relocate_from(at))?;
    query.update_positions(filter, &PositionUpdate::flip_negatives())?;
    Ok(moved)
}

/// Move every row to its target position
///
/// `targets` maps current position to final position. Targets must be
/// positive and pairwise distinct. Rows not named in `targets` keep their
/// position. Returns the number of rows the first statement matched.
pub(crate) fn renumber<Q: PeerQuery>(
    query: &mut Q,
    filter: &ScopeFilter,
    targets: &BTreeMap<i64, i64>,
) -> Result<usize> {
    let parked: BTreeMap<i64, i64> = targets.iter().map(|(from, to)| (*from, -to)).collect();
    let matched = query.update_positions(filter, &PositionUpdate::remap(parked))?;
    query.update_positions(filter, &PositionUpdate::flip_negatives())?;
    Ok(matched)
}
