//! Peer group compaction
//!
//! Renumbers a group to 1..N in its current order. A group that is already
//! dense is left alone: no statement is issued at all.

use std::collections::BTreeMap;

use tracing::debug;

use ordinal_core::{PeerQuery, Result, SortableRecord};

use crate::resolver::{PeerCache, PeerGroupResolver};
use crate::shift;

/// Outcome of a compaction
#[derive(Debug, Clone)]
pub struct Compaction<R> {
    /// The peer group in order, positions as they now stand
    pub peers: Vec<R>,
    /// Rows rewritten; 0 when the group was already dense
    pub renumbered: usize,
}

impl<R> Compaction<R> {
    /// True when nothing needed renumbering
    pub fn is_noop(&self) -> bool {
        self.renumbered == 0
    }
}

/// Renumbers peer groups to a dense sequence
#[derive(Debug, Clone, Copy)]
pub struct Compactor<'r> {
    resolver: &'r PeerGroupResolver,
}

impl<'r> Compactor<'r> {
    /// Compactor resolving peers through `resolver`
    pub fn new(resolver: &'r PeerGroupResolver) -> Self {
        Self { resolver }
    }

    /// Renumber `record`'s peer group to 1..N
    ///
    /// The group's current order decides the new numbering. Peers without a
    /// position (unsaved members of a loaded collection) are skipped. If
    /// `record` is in the group its in-memory position is updated to match
    /// and marked as persisted.
    pub fn compact<Q, R>(
        &self,
        query: &mut Q,
        record: &mut R,
        mut cache: Option<&mut PeerCache<R>>,
    ) -> Result<Compaction<R>>
    where
        Q: PeerQuery<Record = R>,
        R: SortableRecord,
    {
        let group = self.resolver.peers(&*record, cache.as_deref(), false);
        let filter = group.filter().clone();
        let mut peers: Vec<R> = group
            .load(query)?
            .iter()
            .filter(|peer| peer.position().is_some())
            .cloned()
            .collect();

        let mut targets = BTreeMap::new();
        let mut dense = true;
        for (i, peer) in peers.iter().enumerate() {
            let target = i as i64 + 1;
            if let Some(current) = peer.position() {
                dense &= current == target;
                targets.insert(current, target);
            }
        }

        if dense {
            debug!(
                target: "ordinal::engine",
                scope = %filter,
                peers = peers.len(),
                "Group already dense"
            );
            return Ok(Compaction {
                peers,
                renumbered: 0,
            });
        }

        let renumbered = shift::renumber(query, &filter, &targets)?;
        for (i, peer) in peers.iter_mut().enumerate() {
            peer.set_position(i as i64 + 1);
            peer.clear_position_change();
            if peer.is_same_record(record) {
                record.set_position(i as i64 + 1);
                record.clear_position_change();
            }
        }
        self.resolver.invalidate(cache.as_deref_mut());
        debug!(
            target: "ordinal::engine",
            scope = %filter,
            renumbered,
            "Compacted group"
        );
        Ok(Compaction { peers, renumbered })
    }
}
