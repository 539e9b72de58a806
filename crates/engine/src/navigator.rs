//! Adjacent-peer navigation
//!
//! `next`/`previous` answer from the container's loaded collection when one
//! is available, and otherwise ask the store for a single row with a bounded
//! range query.

use ordinal_core::{OrdinalError, PeerQuery, Result, SortableRecord};

use crate::resolver::{PeerCache, PeerGroupResolver};

/// Finds a record's neighbours within its peer group
#[derive(Debug, Clone, Copy)]
pub struct Navigator<'r> {
    resolver: &'r PeerGroupResolver,
}

impl<'r> Navigator<'r> {
    /// Navigator resolving peers through `resolver`
    pub fn new(resolver: &'r PeerGroupResolver) -> Self {
        Self { resolver }
    }

    /// The peer with the smallest position greater than `record`'s
    pub fn next<Q, R>(
        &self,
        query: &mut Q,
        record: &R,
        cache: Option<&PeerCache<R>>,
    ) -> Result<Option<R>>
    where
        Q: PeerQuery<Record = R>,
        R: SortableRecord,
    {
        let position = record.position().ok_or(OrdinalError::Unpositioned)?;
        self.resolver
            .peers(record, cache, false)
            .first_after(query, position)
    }

    /// The peer with the largest position smaller than `record`'s
    pub fn previous<Q, R>(
        &self,
        query: &mut Q,
        record: &R,
        cache: Option<&PeerCache<R>>,
    ) -> Result<Option<R>>
    where
        Q: PeerQuery<Record = R>,
        R: SortableRecord,
    {
        let position = record.position().ok_or(OrdinalError::Unpositioned)?;
        self.resolver
            .peers(record, cache, false)
            .last_before(query, position)
    }
}
