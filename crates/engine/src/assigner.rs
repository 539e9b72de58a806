//! Position assignment before persistence
//!
//! Runs once per save attempt, before the store sees the record:
//!
//! - no position: append after the group's current maximum
//! - explicit position already held by another peer: shift that peer and
//!   everything above it up by one, then keep the requested position
//! - otherwise nothing to do
//!
//! Store rejections propagate unchanged. Nothing here retries.

use tracing::debug;

use ordinal_core::{OrdinalError, PeerQuery, Result, SortableRecord};

use crate::resolver::{PeerCache, PeerGroupResolver};
use crate::shift;

/// What `before_persist` did to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Position set, scope and position unchanged since load
    Unchanged,
    /// No position was set; appended after the group maximum
    Appended {
        /// Position assigned
        position: i64,
    },
    /// Explicit position was free
    Kept {
        /// Position requested by the caller
        position: i64,
    },
    /// Explicit position was taken; peers at or above it moved up by one
    Shifted {
        /// Position requested by the caller
        position: i64,
        /// Peers moved
        shifted: usize,
    },
}

impl Assignment {
    /// Position the record ends up with, if this pass decided one
    pub fn position(&self) -> Option<i64> {
        match self {
            Assignment::Unchanged => None,
            Assignment::Appended { position }
            | Assignment::Kept { position }
            | Assignment::Shifted { position, .. } => Some(*position),
        }
    }
}

/// Assigns or defends a record's position before it is written
#[derive(Debug, Clone, Copy)]
pub struct PositionAssigner<'r> {
    resolver: &'r PeerGroupResolver,
}

impl<'r> PositionAssigner<'r> {
    /// Assigner resolving peers through `resolver`
    pub fn new(resolver: &'r PeerGroupResolver) -> Self {
        Self { resolver }
    }

    /// Prepare `record` for persistence
    ///
    /// Must run inside the transaction that will write the record, so that
    /// any peer shift commits or rolls back together with it. `cache` is the
    /// record's container collection, if the caller has one loaded; it is
    /// reset whenever peer positions change underneath it.
    pub fn before_persist<Q, R>(
        &self,
        query: &mut Q,
        record: &mut R,
        mut cache: Option<&mut PeerCache<R>>,
    ) -> Result<Assignment>
    where
        Q: PeerQuery<Record = R>,
        R: SortableRecord,
    {
        let scope_changed = self.resolver.scope_changed(record);
        let requested = record.position();
        if requested.is_some() && !scope_changed && !record.position_changed() {
            return Ok(Assignment::Unchanged);
        }

        let group = self
            .resolver
            .peers(&*record, cache.as_deref(), scope_changed);

        let Some(position) = requested else {
            let max = group.max_position(query)?;
            let position = max.checked_add(1).ok_or_else(|| {
                OrdinalError::invalid_input(format!(
                    "no position left after {} in group {}",
                    max,
                    group.filter()
                ))
            })?;
            record.set_position(position);
            debug!(
                target: "ordinal::engine",
                scope = %group.filter(),
                position,
                "Appended record"
            );
            return Ok(Assignment::Appended { position });
        };

        let taken = group
            .load(query)?
            .iter()
            .any(|peer| !peer.is_same_record(record) && peer.position() == Some(position));
        if !taken {
            return Ok(Assignment::Kept { position });
        }

        let filter = group.filter().clone();
        let shifted = shift::open_gap(query, &filter, position)?;
        self.resolver.invalidate(cache.as_deref_mut());
        debug!(
            target: "ordinal::engine",
            scope = %filter,
            position,
            shifted,
            "Opened gap for record"
        );
        Ok(Assignment::Shifted { position, shifted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{container_config, MemoryPeers, SCOPE};
    use ordinal_core::{Constraint, Record};

    fn resolver() -> PeerGroupResolver {
        PeerGroupResolver::new(&container_config())
    }

    fn new_item(container: i64) -> Record {
        Record::new().with(SCOPE, container)
    }

    // ========================================
    // Auto-assignment
    // ========================================

    #[test]
    fn test_first_record_gets_one() {
        let resolver = resolver();
        let mut store = MemoryPeers::default();
        let mut record = new_item(1);
        let outcome = PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, None)
            .unwrap();
        assert_eq!(outcome, Assignment::Appended { position: 1 });
        assert_eq!(record.position(), Some(1));
        assert_eq!(store.statements, 0);
    }

    #[test]
    fn test_appends_after_max_with_aggregate_query() {
        let resolver = resolver();
        let mut store = MemoryPeers::with_positions(1, &[1, 7, 3]);
        let mut record = new_item(1);
        PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, None)
            .unwrap();
        assert_eq!(record.position(), Some(8));
        assert_eq!(store.queries, 1);
    }

    #[test]
    fn test_appends_after_cached_max_without_query() {
        let resolver = resolver();
        let mut store = MemoryPeers::default();
        let mut cache = PeerCache::loaded(vec![
            new_item(1).with_position(2),
            new_item(1).with_position(4),
        ]);
        let mut record = new_item(1);
        PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, Some(&mut cache))
            .unwrap();
        assert_eq!(record.position(), Some(5));
        assert_eq!(store.queries, 0);
        assert!(cache.is_loaded());
    }

    #[test]
    fn test_scopes_number_independently() {
        let resolver = resolver();
        let mut store = MemoryPeers::with_positions(1, &[1, 2, 3]);
        let mut record = new_item(2);
        PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, None)
            .unwrap();
        assert_eq!(record.position(), Some(1));
    }

    #[test]
    fn test_append_after_max_position_is_rejected() {
        let resolver = resolver();
        let mut store = MemoryPeers::with_positions(1, &[i64::MAX]);
        let mut record = new_item(1);
        let err = PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, None)
            .unwrap_err();
        assert!(matches!(err, OrdinalError::InvalidInput(_)));
        assert_eq!(record.position(), None);
    }

    // ========================================
    // Explicit positions
    // ========================================

    #[test]
    fn test_free_explicit_position_is_kept() {
        let resolver = resolver();
        let mut store = MemoryPeers::with_positions(1, &[1, 2]);
        let mut record = new_item(1).with_position(5);
        let outcome = PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, None)
            .unwrap();
        assert_eq!(outcome, Assignment::Kept { position: 5 });
        assert_eq!(store.statements, 0);
    }

    #[test]
    fn test_collision_shifts_peers_at_or_above() {
        let resolver = resolver();
        let mut store = MemoryPeers::with_positions(1, &[1, 2, 4]);
        let mut record = new_item(1).with_position(2);
        let outcome = PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, None)
            .unwrap();
        assert_eq!(
            outcome,
            Assignment::Shifted {
                position: 2,
                shifted: 2
            }
        );
        assert_eq!(record.position(), Some(2));
        assert_eq!(store.positions(1), vec![1, 3, 5]);
        assert_eq!(store.statements, 2);
    }

    #[test]
    fn test_collision_that_would_pass_max_position_is_rejected() {
        let resolver = resolver();
        let mut store = MemoryPeers::with_positions(1, &[3, i64::MAX]);
        let mut record = new_item(1).with_position(3);
        let err = PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, None)
            .unwrap_err();
        assert!(matches!(err, OrdinalError::InvalidInput(_)));
        assert_eq!(store.positions(1), vec![3, i64::MAX]);
        assert_eq!(store.statements, 0);
    }

    #[test]
    fn test_collision_invalidates_cache() {
        let resolver = resolver();
        let mut store = MemoryPeers::default();
        let peers = store.seed(1, &[1, 2]);
        let mut cache = PeerCache::loaded(peers);
        let mut record = new_item(1).with_position(1);
        PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, Some(&mut cache))
            .unwrap();
        assert!(!cache.is_loaded());
        assert_eq!(store.positions(1), vec![2, 3]);
    }

    #[test]
    fn test_clean_record_is_untouched() {
        let resolver = resolver();
        let mut store = MemoryPeers::default();
        let mut record = store.insert(1, 1);
        let outcome = PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, None)
            .unwrap();
        assert_eq!(outcome, Assignment::Unchanged);
        assert_eq!(store.queries, 0);
    }

    #[test]
    fn test_own_row_is_not_a_collision() {
        let resolver = resolver();
        let mut store = MemoryPeers::default();
        let mut record = store.insert(1, 3);
        store.insert(1, 1);
        // The container's collection already shows the record at its new slot
        let mut seen = record.clone();
        seen.set_position(2);
        let mut cache = PeerCache::loaded(vec![seen]);
        record.set_position(2);
        let outcome = PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, Some(&mut cache))
            .unwrap();
        assert_eq!(outcome, Assignment::Kept { position: 2 });
        assert_eq!(store.statements, 0);
        assert!(cache.is_loaded());
    }

    #[test]
    fn test_dirty_back_to_persisted_value_is_unchanged() {
        let resolver = resolver();
        let mut store = MemoryPeers::default();
        let mut record = store.insert(1, 3);
        record.set_position(2);
        record.set_position(3);
        let outcome = PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, None)
            .unwrap();
        assert_eq!(outcome, Assignment::Unchanged);
    }

    #[test]
    fn test_moving_within_group_shifts_others_and_own_row() {
        let resolver = resolver();
        let mut store = MemoryPeers::default();
        let rows = store.seed(1, &[1, 2, 3]);
        let mut moving = rows[2].clone();
        moving.set_position(1);
        PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut moving, None)
            .unwrap();
        assert_eq!(store.position_of(&rows[0]), Some(2));
        assert_eq!(store.position_of(&rows[1]), Some(3));
        assert_eq!(store.position_of(&rows[2]), Some(4));
        assert_eq!(moving.position(), Some(1));
    }

    #[test]
    fn test_scope_change_ignores_stale_cache() {
        let resolver = resolver();
        let mut store = MemoryPeers::default();
        let mut record = store.insert(1, 1);
        store.seed(2, &[1, 2]);
        // Cache still describes container 1
        let mut cache = PeerCache::loaded(vec![record.clone()]);
        record.set(SCOPE, 2);
        let outcome = PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, Some(&mut cache))
            .unwrap();
        assert_eq!(
            outcome,
            Assignment::Shifted {
                position: 1,
                shifted: 2
            }
        );
        assert_eq!(store.positions(2), vec![2, 3]);
        assert_eq!(store.positions(1), vec![1]);
    }

    #[test]
    fn test_store_rejection_propagates() {
        struct Rejecting(MemoryPeers);
        impl PeerQuery for Rejecting {
            type Record = Record;
            fn select_peers(&mut self, f: &ordinal_core::ScopeFilter) -> Result<Vec<Record>> {
                self.0.select_peers(f)
            }
            fn max_position(&mut self, f: &ordinal_core::ScopeFilter) -> Result<Option<i64>> {
                self.0.max_position(f)
            }
            fn first_after(
                &mut self,
                f: &ordinal_core::ScopeFilter,
                p: i64,
            ) -> Result<Option<Record>> {
                self.0.first_after(f, p)
            }
            fn last_before(
                &mut self,
                f: &ordinal_core::ScopeFilter,
                p: i64,
            ) -> Result<Option<Record>> {
                self.0.last_before(f, p)
            }
            fn update_positions(
                &mut self,
                _: &ordinal_core::ScopeFilter,
                _: &ordinal_core::PositionUpdate,
            ) -> Result<usize> {
                Err(OrdinalError::constraint("items", Constraint::Unique, "raced"))
            }
        }

        let resolver = resolver();
        let mut store = Rejecting(MemoryPeers::with_positions(1, &[1]));
        let mut record = new_item(1).with_position(1);
        let err = PositionAssigner::new(&resolver)
            .before_persist(&mut store, &mut record, None)
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
