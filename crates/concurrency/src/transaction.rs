//! Transaction context
//!
//! A `Transaction` holds the database's catalog lock for its whole lifetime,
//! so transactions are serialized: the lock is the mutual-exclusion point
//! for every peer group. Writes apply to the live catalog immediately. The
//! first write to a table saves a copy of that table, and rollback puts the
//! saved copies back. Read-only transactions copy nothing.
//!
//! State transitions:
//! - `Active` → `Committed` (deferred checks passed)
//! - `Active` → `Aborted` (explicit rollback, failed deferred check, or drop)
//!
//! Each statement is atomic on its own: a statement that fails leaves the
//! transaction active with every earlier statement still applied. The caller
//! decides whether to carry on or roll back.

use std::collections::BTreeMap;

use parking_lot::MutexGuard;
use tracing::{debug, warn};

use ordinal_core::{
    OrdinalError, PeerQuery, PositionUpdate, Record, RecordId, Result, ScopeFilter, Value,
};
use ordinal_storage::{Catalog, Table};

/// Status of a transaction in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction committed successfully
    Committed,
    /// Transaction was rolled back
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// An open transaction over the whole catalog
pub struct Transaction<'db> {
    catalog: MutexGuard<'db, Catalog>,
    undo: BTreeMap<String, Table>,
    status: TransactionStatus,
    statements: usize,
}

impl<'db> Transaction<'db> {
    pub(crate) fn begin(catalog: MutexGuard<'db, Catalog>) -> Self {
        Self {
            catalog,
            undo: BTreeMap::new(),
            status: TransactionStatus::Active,
            statements: 0,
        }
    }

    /// Current status
    pub fn status(&self) -> &TransactionStatus {
        &self.status
    }

    /// Write statements executed so far
    pub fn statements(&self) -> usize {
        self.statements
    }

    fn ensure_active(&self) -> Result<()> {
        match &self.status {
            TransactionStatus::Active => Ok(()),
            other => Err(OrdinalError::TransactionNotActive {
                state: format!("{:?}", other),
            }),
        }
    }

    fn read_table(&self, name: &str) -> Result<&Table> {
        self.ensure_active()?;
        self.catalog.table(name)
    }

    fn write_table(&mut self, name: &str) -> Result<&mut Table> {
        self.ensure_active()?;
        if !self.undo.contains_key(name) {
            let before = self.catalog.table(name)?.clone();
            self.undo.insert(name.to_string(), before);
        }
        self.catalog.table_mut(name)
    }

    /// Names of the tables this transaction has written to
    pub fn written_tables(&self) -> Vec<&str> {
        self.undo.keys().map(String::as_str).collect()
    }

    // ========================================================================
    // Row operations
    // ========================================================================

    /// Insert a row and return its newly allocated id
    pub fn insert(
        &mut self,
        table: &str,
        attributes: BTreeMap<String, Value>,
        position: Option<i64>,
    ) -> Result<RecordId> {
        self.ensure_active()?;
        self.catalog.table(table)?;
        let id = self.catalog.allocate_id();
        self.write_table(table)?.insert(id, attributes, position)?;
        self.statements += 1;
        Ok(id)
    }

    /// Replace a row's attributes and position
    pub fn update(
        &mut self,
        table: &str,
        id: RecordId,
        attributes: BTreeMap<String, Value>,
        position: Option<i64>,
    ) -> Result<()> {
        self.write_table(table)?.update(id, attributes, position)?;
        self.statements += 1;
        Ok(())
    }

    /// Delete a row; returns false if it did not exist
    pub fn delete(&mut self, table: &str, id: RecordId) -> Result<bool> {
        let deleted = self.write_table(table)?.delete(id);
        if deleted {
            self.statements += 1;
        }
        Ok(deleted)
    }

    /// Read a row by id
    pub fn get(&self, table: &str, id: RecordId) -> Result<Option<Record>> {
        Ok(self.read_table(table)?.get(id))
    }

    /// Peer queries against one table, inside this transaction
    pub fn table(&mut self, name: &str) -> Result<TableQuery<'_, 'db>> {
        self.read_table(name)?;
        Ok(TableQuery {
            txn: self,
            table: name.to_string(),
        })
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Run deferred checks and make the transaction's writes permanent
    ///
    /// If a deferred check fails the transaction is rolled back and the
    /// violation is returned.
    pub fn commit(mut self) -> Result<()> {
        self.ensure_active()?;
        let checked = self.catalog.check_deferred(self.undo.keys().map(String::as_str));
        if let Err(e) = checked {
            self.restore(format!("deferred check failed: {}", e));
            return Err(e);
        }
        self.undo.clear();
        self.status = TransactionStatus::Committed;
        debug!(target: "ordinal::txn", statements = self.statements, "Transaction committed");
        Ok(())
    }

    /// Discard every write made by this transaction
    pub fn rollback(mut self) {
        self.restore("rolled back by caller".to_string());
    }

    fn restore(&mut self, reason: String) {
        let restored = self.undo.len();
        for (_, table) in std::mem::take(&mut self.undo) {
            self.catalog.restore_table(table);
        }
        debug!(
            target: "ordinal::txn",
            reason = %reason,
            tables = restored,
            "Transaction aborted"
        );
        self.status = TransactionStatus::Aborted { reason };
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.status == TransactionStatus::Active {
            warn!(
                target: "ordinal::txn",
                statements = self.statements,
                "Transaction dropped without commit, rolling back"
            );
            self.restore("dropped without commit".to_string());
        }
    }
}

/// `PeerQuery` over one table, borrowed from a transaction
pub struct TableQuery<'t, 'db> {
    txn: &'t mut Transaction<'db>,
    table: String,
}

impl TableQuery<'_, '_> {
    /// Table name
    pub fn name(&self) -> &str {
        &self.table
    }
}

impl PeerQuery for TableQuery<'_, '_> {
    type Record = Record;

    fn select_peers(&mut self, filter: &ScopeFilter) -> Result<Vec<Record>> {
        Ok(self.txn.read_table(&self.table)?.select(filter))
    }

    fn max_position(&mut self, filter: &ScopeFilter) -> Result<Option<i64>> {
        Ok(self.txn.read_table(&self.table)?.max_position(filter))
    }

    fn first_after(&mut self, filter: &ScopeFilter, position: i64) -> Result<Option<Record>> {
        Ok(self.txn.read_table(&self.table)?.first_after(filter, position))
    }

    fn last_before(&mut self, filter: &ScopeFilter, position: i64) -> Result<Option<Record>> {
        Ok(self.txn.read_table(&self.table)?.last_before(filter, position))
    }

    fn update_positions(&mut self, filter: &ScopeFilter, update: &PositionUpdate) -> Result<usize> {
        let matched = self
            .txn
            .write_table(&self.table)?
            .update_positions(filter, update)?;
        self.txn.statements += 1;
        Ok(matched)
    }
}
