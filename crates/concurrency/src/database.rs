//! Database handle
//!
//! Owns the catalog behind a `parking_lot::Mutex`. Every transaction takes
//! that lock for its whole lifetime, which serializes writers: two
//! transactions renumbering the same peer group can never interleave.
//!
//! Transactions are not reentrant. Opening a second transaction on a thread
//! that already holds one deadlocks; pass the open transaction down instead.

use parking_lot::Mutex;
use tracing::info;

use ordinal_core::Result;
use ordinal_storage::{Catalog, TableSchema, TableStats};

use crate::transaction::Transaction;

/// In-memory database of sortable tables
#[derive(Debug, Default)]
pub struct Database {
    catalog: Mutex<Catalog>,
}

impl Database {
    /// Open an empty database
    pub fn new() -> Self {
        info!(target: "ordinal::db", "Opened in-memory database");
        Self::default()
    }

    /// Create a table
    pub fn create_table(&self, schema: TableSchema) -> Result<()> {
        self.catalog.lock().create_table(schema)
    }

    /// Begin a transaction for manual control
    ///
    /// The transaction must be committed explicitly; dropping it rolls back.
    /// Prefer `transaction()` for automatic handling.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction::begin(self.catalog.lock())
    }

    /// Execute a closure inside a transaction
    ///
    /// Commits when the closure returns `Ok`, rolls back when it returns
    /// `Err`. A failing deferred check at commit also rolls back.
    ///
    /// # Example
    /// ```text
    /// let id = db.transaction(|txn| txn.insert("items", attrs, Some(1)))?;
    /// ```
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T>,
    {
        let mut txn = self.begin();
        match f(&mut txn) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(e) => {
                txn.rollback();
                Err(e)
            }
        }
    }

    /// Write counters of one table
    pub fn stats(&self, table: &str) -> Result<TableStats> {
        Ok(self.catalog.lock().table(table)?.stats())
    }

    /// Number of rows in one table
    pub fn row_count(&self, table: &str) -> Result<usize> {
        Ok(self.catalog.lock().table(table)?.len())
    }
}
