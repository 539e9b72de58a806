//! Sequencer: the four sequencing operations behind one configured handle
//!
//! A `Sequencer` is built once per record type from its `SortableConfig` and
//! then used for every record of that type. It holds no per-record state;
//! the transaction and the container's loaded collection are passed to each
//! call.

use ordinal_core::{PeerQuery, Result, SortableConfig, SortableRecord};

use crate::assigner::{Assignment, PositionAssigner};
use crate::compactor::{Compaction, Compactor};
use crate::navigator::Navigator;
use crate::resolver::{PeerCache, PeerGroupResolver};

/// Maintains dense, unique positions for records declared by one config
#[derive(Debug, Clone)]
pub struct Sequencer {
    config: SortableConfig,
    resolver: PeerGroupResolver,
}

impl Sequencer {
    /// Sequencer for records following `config`
    ///
    /// # Errors
    ///
    /// Returns `OrdinalError::Config` when the config is inconsistent.
    pub fn new(config: SortableConfig) -> Result<Self> {
        config.validate()?;
        let resolver = PeerGroupResolver::new(&config);
        Ok(Self { config, resolver })
    }

    /// The config this sequencer was built from
    pub fn config(&self) -> &SortableConfig {
        &self.config
    }

    /// Peer group resolution for this record type
    pub fn resolver(&self) -> &PeerGroupResolver {
        &self.resolver
    }

    /// `record`'s peer group, ascending by position
    ///
    /// Includes `record` itself once persisted.
    pub fn peers<Q, R>(&self, query: &mut Q, record: &R, cache: Option<&PeerCache<R>>) -> Result<Vec<R>>
    where
        Q: PeerQuery<Record = R>,
        R: SortableRecord,
    {
        Ok(self
            .resolver
            .peers(record, cache, false)
            .load(query)?
            .into_owned())
    }

    /// Assign or defend `record`'s position before it is written
    pub fn before_persist<Q, R>(
        &self,
        query: &mut Q,
        record: &mut R,
        cache: Option<&mut PeerCache<R>>,
    ) -> Result<Assignment>
    where
        Q: PeerQuery<Record = R>,
        R: SortableRecord,
    {
        PositionAssigner::new(&self.resolver).before_persist(query, record, cache)
    }

    /// The peer directly after `record`
    pub fn next<Q, R>(&self, query: &mut Q, record: &R, cache: Option<&PeerCache<R>>) -> Result<Option<R>>
    where
        Q: PeerQuery<Record = R>,
        R: SortableRecord,
    {
        Navigator::new(&self.resolver).next(query, record, cache)
    }

    /// The peer directly before `record`
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
        Navigator::new(&self.resolver).previous(query, record, cache)
    }

    /// Renumber `record`'s peer group to 1..N
    pub fn compact<Q, R>(
        &self,
        query: &mut Q,
        record: &mut R,
        cache: Option<&mut PeerCache<R>>,
    ) -> Result<Compaction<R>>
    where
        Q: PeerQuery<Record = R>,
        R: SortableRecord,
    {
        Compactor::new(&self.resolver).compact(query, record, cache)
    }
}
