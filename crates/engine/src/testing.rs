//! In-memory `PeerQuery` for unit tests
//!
//! Wraps a storage `Table` with row-by-row unique checking, the strictest
//! mode, and counts reads and write statements separately.

use std::collections::BTreeMap;

use ordinal_core::{
    ContainerConfig, PeerQuery, PositionUpdate, Record, RecordId, Result, ScopeFilter,
    SortableConfig, Value,
};
use ordinal_storage::{Table, TableSchema};

pub(crate) const SCOPE: &str = "container_id";

pub(crate) fn container_config() -> SortableConfig {
    SortableConfig::new().with_container(ContainerConfig::new("container", SCOPE))
}

pub(crate) struct MemoryPeers {
    pub table: Table,
    pub queries: usize,
    pub statements: usize,
    next_id: u64,
}

impl Default for MemoryPeers {
    fn default() -> Self {
        let schema = TableSchema::from_config("items", &container_config())
            .expect("valid test schema");
        Self {
            table: Table::new(schema),
            queries: 0,
            statements: 0,
            next_id: 0,
        }
    }
}

impl MemoryPeers {
    pub fn with_positions(container: i64, positions: &[i64]) -> Self {
        let mut store = Self::default();
        store.seed(container, positions);
        store
    }

    pub fn scope(container: i64) -> ScopeFilter {
        ScopeFilter::global().and(SCOPE, container)
    }

    pub fn seed(&mut self, container: i64, positions: &[i64]) -> Vec<Record> {
        positions
            .iter()
            .map(|p| self.insert(container, *p))
            .collect()
    }

    pub fn insert(&mut self, container: i64, position: i64) -> Record {
        self.next_id += 1;
        let id = RecordId::new(self.next_id);
        let attributes: BTreeMap<String, Value> =
            [(SCOPE.to_string(), Value::Int(container))].into_iter().collect();
        self.table
            .insert(id, attributes.clone(), Some(position))
            .expect("seed insert");
        Record::loaded(id, attributes, position)
    }

    pub fn positions(&self, container: i64) -> Vec<i64> {
        self.table
            .select(&Self::scope(container))
            .iter()
            .filter_map(|r| r.position())
            .collect()
    }

    pub fn ids(&self, container: i64) -> Vec<u64> {
        self.table
            .select(&Self::scope(container))
            .iter()
            .filter_map(|r| r.id().map(|id| id.as_u64()))
            .collect()
    }

    pub fn position_of(&self, record: &Record) -> Option<i64> {
        record
            .id()
            .and_then(|id| self.table.get(id))
            .and_then(|r| r.position())
    }
}

impl PeerQuery for MemoryPeers {
    type Record = Record;

    fn select_peers(&mut self, filter: &ScopeFilter) -> Result<Vec<Record>> {
        self.queries += 1;
        Ok(self.table.select(filter))
    }

    fn max_position(&mut self, filter: &ScopeFilter) -> Result<Option<i64>> {
        self.queries += 1;
        Ok(self.table.max_position(filter))
    }

    fn first_after(&mut self, filter: &ScopeFilter, position: i64) -> Result<Option<Record>> {
        self.queries += 1;
        Ok(self.table.first_after(filter, position))
    }

    fn last_before(&mut self, filter: &ScopeFilter, position: i64) -> Result<Option<Record>> {
        self.queries += 1;
        Ok(self.table.last_before(filter, position))
    }

    fn update_positions(&mut self, filter: &ScopeFilter, update: &PositionUpdate) -> Result<usize> {
        let matched = self.table.update_positions(filter, update)?;
        self.statements += 1;
        Ok(matched)
    }
}
