//! Table: rows of one sortable table plus its unique index
//!
//! Every write goes through the unique index. A failing statement leaves the
//! table exactly as it was before the statement started; rolling back
//! earlier statements is the transaction layer's job.
//!
//! # Constraint checking
//!
//! - `ConstraintCheck::Row`: a bulk update claims each row's new slot as it
//!   goes, in storage (id) order. A shift that moves a row onto a slot its
//!   neighbour has not vacated yet fails.
//! - `ConstraintCheck::Statement`: every old slot is released before any new
//!   slot is claimed, so only the statement's end state must be unique.
//!
//! Positivity is not checked here per statement; see `check_positive`.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use ordinal_core::{
    Constraint, OrdinalError, PositionUpdate, Record, RecordId, Result, ScopeFilter, ScopeKey,
    Value,
};

use crate::index::UniqueIndex;
use crate::schema::{ConstraintCheck, TableSchema};

#[derive(Debug, Clone)]
struct Row {
    attributes: BTreeMap<String, Value>,
    position: i64,
}

impl Row {
    fn matches(&self, filter: &ScopeFilter) -> bool {
        filter.conditions().iter().all(|(name, value)| {
            self.attributes.get(name).unwrap_or(&Value::Null) == value
        })
    }
}

/// Write counters for one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Successful write statements (insert, update, delete, bulk update)
    pub statements: u64,
    /// Rows touched by successful write statements
    pub rows_written: u64,
}

/// One planned row move inside a bulk update
#[derive(Debug, Clone)]
struct Move {
    id: RecordId,
    scope: ScopeKey,
    from: i64,
    to: i64,
}

/// Rows and unique index of one sortable table
#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<RecordId, Row>,
    index: UniqueIndex,
    stats: TableStats,
}

impl Table {
    /// Create an empty table
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            index: UniqueIndex::new(),
            stats: TableStats::default(),
        }
    }

    /// Table schema
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write counters
    pub fn stats(&self) -> TableStats {
        self.stats
    }

    fn scope_key(&self, attributes: &BTreeMap<String, Value>) -> ScopeKey {
        self.schema
            .scope_columns
            .iter()
            .map(|c| attributes.get(c).cloned().unwrap_or(Value::Null))
            .collect()
    }

    fn unique_violation(&self, scope: &ScopeKey, position: i64, holder: RecordId) -> OrdinalError {
        warn!(
            target: "ordinal::storage",
            table = %self.schema.name,
            position,
            holder = %holder,
            "Unique constraint violation"
        );
        OrdinalError::constraint(
            self.schema.name.clone(),
            Constraint::Unique,
            format!(
                "{} = {} in scope {:?} is already held by record {}",
                self.schema.position_column,
                position,
                scope.as_slice(),
                holder
            ),
        )
    }

    fn not_null_violation(&self) -> OrdinalError {
        OrdinalError::constraint(
            self.schema.name.clone(),
            Constraint::NotNull,
            format!("{} is NULL", self.schema.position_column),
        )
    }

    fn record(id: RecordId, row: &Row) -> Record {
        Record::loaded(id, row.attributes.clone(), row.position)
    }

    fn count_write(&mut self, rows: usize) {
        self.stats.statements += 1;
        self.stats.rows_written += rows as u64;
    }

    // ========================================================================
    // Row statements
    // ========================================================================

    /// Insert a row under a fresh `id`
    pub fn insert(
        &mut self,
        id: RecordId,
        attributes: BTreeMap<String, Value>,
        position: Option<i64>,
    ) -> Result<()> {
        let position = position.ok_or_else(|| self.not_null_violation())?;
        if self.rows.contains_key(&id) {
            return Err(OrdinalError::storage(format!(
                "record {} already exists in table '{}'",
                id, self.schema.name
            )));
        }
        let scope = self.scope_key(&attributes);
        if let Err(holder) = self.index.claim(scope.clone(), position, id) {
            return Err(self.unique_violation(&scope, position, holder));
        }
        self.rows.insert(id, Row { attributes, position });
        self.count_write(1);
        Ok(())
    }

    /// Replace the attributes and position of an existing row
    pub fn update(
        &mut self,
        id: RecordId,
        attributes: BTreeMap<String, Value>,
        position: Option<i64>,
    ) -> Result<()> {
        let position = position.ok_or_else(|| self.not_null_violation())?;
        let (old_scope, old_position) = match self.rows.get(&id) {
            Some(row) => (self.scope_key(&row.attributes), row.position),
            None => {
                return Err(OrdinalError::RecordNotFound {
                    table: self.schema.name.clone(),
                    id,
                })
            }
        };
        let scope = self.scope_key(&attributes);

        self.index.release(&old_scope, old_position, id);
        if let Err(holder) = self.index.claim(scope.clone(), position, id) {
            let restored = self.index.claim(old_scope, old_position, id);
            debug_assert!(restored.is_ok());
            return Err(self.unique_violation(&scope, position, holder));
        }
        self.rows.insert(id, Row { attributes, position });
        self.count_write(1);
        Ok(())
    }

    /// Delete a row; returns false if it did not exist
    pub fn delete(&mut self, id: RecordId) -> bool {
        let Some(row) = self.rows.remove(&id) else {
            return false;
        };
        let scope = self.scope_key(&row.attributes);
        self.index.release(&scope, row.position, id);
        self.count_write(1);
        true
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Row by id
    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.rows.get(&id).map(|row| Self::record(id, row))
    }

    fn matching<'a>(&'a self, filter: &'a ScopeFilter) -> impl Iterator<Item = (&'a RecordId, &'a Row)> {
        self.rows.iter().filter(move |(_, row)| row.matches(filter))
    }

    /// Rows matching `filter`, ascending by position
    pub fn select(&self, filter: &ScopeFilter) -> Vec<Record> {
        let mut rows: Vec<(&RecordId, &Row)> = self.matching(filter).collect();
        rows.sort_by_key(|(id, row)| (row.position, **id));
        rows.into_iter().map(|(id, row)| Self::record(*id, row)).collect()
    }

    /// Largest position among rows matching `filter`
    pub fn max_position(&self, filter: &ScopeFilter) -> Option<i64> {
        self.matching(filter).map(|(_, row)| row.position).max()
    }

    /// Matching row with the smallest position strictly greater than `position`
    pub fn first_after(&self, filter: &ScopeFilter, position: i64) -> Option<Record> {
        self.matching(filter)
            .filter(|(_, row)| row.position > position)
            .min_by_key(|(_, row)| row.position)
            .map(|(id, row)| Self::record(*id, row))
    }

    /// Matching row with the largest position strictly less than `position`
    pub fn last_before(&self, filter: &ScopeFilter, position: i64) -> Option<Record> {
        self.matching(filter)
            .filter(|(_, row)| row.position < position)
            .max_by_key(|(_, row)| row.position)
            .map(|(id, row)| Self::record(*id, row))
    }

    // ========================================================================
    // Bulk position updates
    // ========================================================================

    /// Execute one bulk position update as a single statement
    ///
    /// Returns the number of rows matched. On a constraint violation no row
    /// of this statement stays modified. A statement that would push a
    /// position out of the `i64` range is rejected before any row moves.
    pub fn update_positions(&mut self, filter: &ScopeFilter, update: &PositionUpdate) -> Result<usize> {
        let mut moves: Vec<Move> = Vec::new();
        for (id, row) in self.matching(filter) {
            if let Some(to) = update.target(row.position)? {
                moves.push(Move {
                    id: *id,
                    scope: self.scope_key(&row.attributes),
                    from: row.position,
                    to,
                });
            }
        }

        match self.schema.constraint_check {
            ConstraintCheck::Row => self.apply_row_by_row(&moves)?,
            ConstraintCheck::Statement => self.apply_whole_statement(&moves)?,
        }

        for m in &moves {
            if let Some(row) = self.rows.get_mut(&m.id) {
                row.position = m.to;
            }
        }
        self.count_write(moves.len());
        debug!(
            target: "ordinal::storage",
            table = %self.schema.name,
            scope = %filter,
            statement = %update,
            rows = moves.len(),
            "Bulk position update"
        );
        Ok(moves.len())
    }

    fn apply_row_by_row(&mut self, moves: &[Move]) -> Result<()> {
        for (i, m) in moves.iter().enumerate() {
            self.index.release(&m.scope, m.from, m.id);
            if let Err(holder) = self.index.claim(m.scope.clone(), m.to, m.id) {
                let restored = self.index.claim(m.scope.clone(), m.from, m.id);
                debug_assert!(restored.is_ok());
                for done in moves[..i].iter().rev() {
                    self.index.release(&done.scope, done.to, done.id);
                    let restored = self.index.claim(done.scope.clone(), done.from, done.id);
                    debug_assert!(restored.is_ok());
                }
                return Err(self.unique_violation(&m.scope, m.to, holder));
            }
        }
        Ok(())
    }

    fn apply_whole_statement(&mut self, moves: &[Move]) -> Result<()> {
        for m in moves {
            self.index.release(&m.scope, m.from, m.id);
        }
        for (i, m) in moves.iter().enumerate() {
            if let Err(holder) = self.index.claim(m.scope.clone(), m.to, m.id) {
                for done in &moves[..i] {
                    self.index.release(&done.scope, done.to, done.id);
                }
                for m in moves {
                    let restored = self.index.claim(m.scope.clone(), m.from, m.id);
                    debug_assert!(restored.is_ok());
                }
                return Err(self.unique_violation(&m.scope, m.to, holder));
            }
        }
        Ok(())
    }

    /// Deferred `position > 0` check over every row
    pub fn check_positive(&self) -> Result<()> {
        match self.rows.iter().find(|(_, row)| row.position <= 0) {
            Some((id, row)) => Err(OrdinalError::constraint(
                self.schema.name.clone(),
                Constraint::Positive,
                format!(
                    "record {} has {} = {}",
                    id, self.schema.position_column, row.position
                ),
            )),
            None => Ok(()),
        }
    }
}
