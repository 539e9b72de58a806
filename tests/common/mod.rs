//! Shared test utilities for the integration test suites.
//!
//! Import via `mod common;` from any test file.

#![allow(dead_code)]

use std::sync::Once;

pub use ordinal::{
    ConstraintCheck, ContainerConfig, Database, OrdinalError, PeerCache, Record, ScopeFilter,
    SortableConfig, SortableTable, Transaction,
};

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness's captured writer.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub const LIST: &str = "list_id";

/// Config for items belonging to a list container.
pub fn list_config() -> SortableConfig {
    SortableConfig::new().with_container(ContainerConfig::new("list", LIST))
}

/// Fresh database with an `items` table grouped by `list_id`.
pub fn items_db() -> (Database, SortableTable) {
    items_db_with(ConstraintCheck::Row)
}

pub fn items_db_with(check: ConstraintCheck) -> (Database, SortableTable) {
    init_tracing();
    let db = Database::new();
    let table = SortableTable::create_with_check(&db, "items", list_config(), check)
        .expect("create items table");
    (db, table)
}

/// Unsaved item in `list`.
pub fn item(list: i64) -> Record {
    Record::new().with(LIST, list)
}

pub fn list(list: i64) -> ScopeFilter {
    ScopeFilter::global().and(LIST, list)
}

/// Positions in `list`, ascending.
pub fn positions(txn: &mut Transaction<'_>, table: &SortableTable, list_id: i64) -> Vec<i64> {
    table
        .load_container(txn, &list(list_id))
        .expect("load list")
        .records()
        .unwrap_or_default()
        .iter()
        .filter_map(|r| r.position())
        .collect()
}

/// Committed positions in `list`, ascending.
pub fn committed_positions(db: &Database, table: &SortableTable, list_id: i64) -> Vec<i64> {
    let mut txn = db.begin();
    let result = positions(&mut txn, table, list_id);
    txn.rollback();
    result
}

/// Current position of a saved record, read back from the store.
pub fn stored_position(txn: &Transaction<'_>, table: &SortableTable, record: &Record) -> i64 {
    let id = record.id().expect("record was saved");
    table
        .find(txn, id)
        .expect("record exists")
        .position()
        .expect("stored rows have a position")
}
