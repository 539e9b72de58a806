//! SortableTable: persistence glue between `Record`, the sequencer and the store
//!
//! Every operation takes the caller's open transaction. `save` runs position
//! assignment and the row write in that transaction, so a peer shift and the
//! write that caused it commit or roll back together.

use tracing::debug;

use ordinal_concurrency::{Database, Transaction};
use ordinal_core::{OrdinalError, PeerQuery, Record, RecordId, Result, ScopeFilter, SortableConfig};
use ordinal_storage::{ConstraintCheck, TableSchema};

use crate::assigner::Assignment;
use crate::compactor::Compaction;
use crate::resolver::PeerCache;
use crate::sequencer::Sequencer;

/// A table of sortable records
#[derive(Debug, Clone)]
pub struct SortableTable {
    name: String,
    sequencer: Sequencer,
}

impl SortableTable {
    /// Create table `name` in `db` with row-by-row unique checking
    pub fn create(db: &Database, name: impl Into<String>, config: SortableConfig) -> Result<Self> {
        Self::create_with_check(db, name, config, ConstraintCheck::Row)
    }

    /// Create table `name` in `db` with the given unique checking mode
    pub fn create_with_check(
        db: &Database,
        name: impl Into<String>,
        config: SortableConfig,
        check: ConstraintCheck,
    ) -> Result<Self> {
        let schema = TableSchema::from_config(name, &config)?.with_constraint_check(check);
        let sequencer = Sequencer::new(config)?;
        let name = schema.name.clone();
        db.create_table(schema)?;
        Ok(Self { name, sequencer })
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The sequencer for this table's records
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Filter selecting `record`'s peer group
    pub fn group_of(&self, record: &Record) -> ScopeFilter {
        self.sequencer.resolver().filter_for(record)
    }

    /// Assign `record`'s position and write it
    ///
    /// New records are inserted, persisted ones updated. On success the
    /// record is clean and carries its id. A loaded `cache` is reset after
    /// the write, since it no longer reflects the group.
    pub fn save(
        &self,
        txn: &mut Transaction<'_>,
        record: &mut Record,
        mut cache: Option<&mut PeerCache<Record>>,
    ) -> Result<Assignment> {
        let assignment = {
            let mut query = txn.table(&self.name)?;
            self.sequencer
                .before_persist(&mut query, record, cache.as_deref_mut())?
        };
        let position = self.validate(record)?;

        let attributes = record.attributes().clone();
        let id = match record.id() {
            Some(id) => {
                txn.update(&self.name, id, attributes, Some(position))?;
                id
            }
            None => txn.insert(&self.name, attributes, Some(position))?,
        };
        record.changes_applied(id);
        self.sequencer.resolver().invalidate(cache);

        debug!(
            target: "ordinal::engine",
            table = %self.name,
            id = %id,
            position,
            "Saved record"
        );
        Ok(assignment)
    }

    fn validate(&self, record: &Record) -> Result<i64> {
        let column = &self.sequencer.config().on;
        match record.position() {
            None => Err(OrdinalError::invalid_input(format!("{} can't be blank", column))),
            Some(p) if p <= 0 => Err(OrdinalError::invalid_input(format!(
                "{} must be greater than 0, got {}",
                column, p
            ))),
            Some(p) => Ok(p),
        }
    }

    /// Delete `record`'s row; returns false if it was never saved or is gone
    ///
    /// Deleting leaves a gap in the group. Use `compact` to close it.
    pub fn delete(&self, txn: &mut Transaction<'_>, record: &Record) -> Result<bool> {
        match record.id() {
            Some(id) => txn.delete(&self.name, id),
            None => Ok(false),
        }
    }

    /// Read a record by id
    pub fn find(&self, txn: &Transaction<'_>, id: RecordId) -> Result<Record> {
        txn.get(&self.name, id)?
            .ok_or_else(|| OrdinalError::RecordNotFound {
                table: self.name.clone(),
                id,
            })
    }

    /// Replace `record` with its stored state, discarding unsaved changes
    pub fn reload(&self, txn: &Transaction<'_>, record: &mut Record) -> Result<()> {
        let id = record
            .id()
            .ok_or_else(|| OrdinalError::invalid_input("cannot reload a record that was never saved"))?;
        *record = self.find(txn, id)?;
        Ok(())
    }

    /// Materialize one group, ascending by position, as a container's loaded collection
    pub fn load_container(
        &self,
        txn: &mut Transaction<'_>,
        group: &ScopeFilter,
    ) -> Result<PeerCache<Record>> {
        let records = txn.table(&self.name)?.select_peers(group)?;
        Ok(PeerCache::loaded(records))
    }

    /// `record`'s peer group, ascending by position
    pub fn peers(
        &self,
        txn: &mut Transaction<'_>,
        record: &Record,
        cache: Option<&PeerCache<Record>>,
    ) -> Result<Vec<Record>> {
        self.sequencer
            .peers(&mut txn.table(&self.name)?, record, cache)
    }

    /// The peer directly after `record`
    pub fn next(
        &self,
        txn: &mut Transaction<'_>,
        record: &Record,
        cache: Option<&PeerCache<Record>>,
    ) -> Result<Option<Record>> {
        self.sequencer
            .next(&mut txn.table(&self.name)?, record, cache)
    }

    /// The peer directly before `record`
    pub fn previous(
        &self,
        txn: &mut Transaction<'_>,
        record: &Record,
        cache: Option<&PeerCache<Record>>,
    ) -> Result<Option<Record>> {
        self.sequencer
            .previous(&mut txn.table(&self.name)?, record, cache)
    }

    /// Renumber `record`'s group to 1..N
    pub fn compact(
        &self,
        txn: &mut Transaction<'_>,
        record: &mut Record,
        cache: Option<&mut PeerCache<Record>>,
    ) -> Result<Compaction<Record>> {
        self.sequencer
            .compact(&mut txn.table(&self.name)?, record, cache)
    }
}
