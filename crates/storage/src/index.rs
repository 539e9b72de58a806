//! Unique index over (scope, position)
//!
//! Maps each occupied (scope key, position) slot to the row holding it.
//! Lookups are O(1) through `FxHashMap`.

use rustc_hash::FxHashMap;

use ordinal_core::{RecordId, ScopeKey};

/// Unique secondary index: (ScopeKey, position) → RecordId
#[derive(Debug, Clone, Default)]
pub struct UniqueIndex {
    slots: FxHashMap<(ScopeKey, i64), RecordId>,
}

impl UniqueIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Holder of a slot, if occupied
    pub fn get(&self, scope: &ScopeKey, position: i64) -> Option<RecordId> {
        self.slots.get(&(scope.clone(), position)).copied()
    }

    /// Claim a slot for `id`
    ///
    /// Returns the current holder without modifying the index if the slot
    /// is already taken by a different row.
    pub fn claim(&mut self, scope: ScopeKey, position: i64, id: RecordId) -> Result<(), RecordId> {
        match self.slots.get(&(scope.clone(), position)) {
            Some(holder) if *holder != id => Err(*holder),
            _ => {
                self.slots.insert((scope, position), id);
                Ok(())
            }
        }
    }

    /// Release a slot if `id` holds it
    pub fn release(&mut self, scope: &ScopeKey, position: i64, id: RecordId) {
        let key = (scope.clone(), position);
        if self.slots.get(&key) == Some(&id) {
            self.slots.remove(&key);
        }
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
