//! Table schema for sortable tables
//!
//! A sortable table has a NOT NULL integer position column and a unique
//! index covering the scope columns plus the position column. The positivity
//! check is deferred to commit, because the renumbering protocols pass rows
//! through negative values mid-transaction.

use ordinal_core::{OrdinalError, Result, SortableConfig};

/// When the unique index is checked during a bulk update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintCheck {
    /// Each row is checked as it is written, in storage order
    #[default]
    Row,
    /// The statement is applied in full, then checked
    Statement,
}

/// Schema of one sortable table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Columns covered by the unique index ahead of the position column
    pub scope_columns: Vec<String>,
    /// Position column
    pub position_column: String,
    /// Unique index checking mode
    pub constraint_check: ConstraintCheck,
}

impl TableSchema {
    /// Schema for a table whose records follow `config`
    pub fn from_config(name: impl Into<String>, config: &SortableConfig) -> Result<Self> {
        config.validate()?;
        let name = name.into();
        if name.trim().is_empty() {
            return Err(OrdinalError::invalid_input("table name is empty"));
        }
        Ok(Self {
            name,
            scope_columns: config.scope_attributes(),
            position_column: config.on.clone(),
            constraint_check: ConstraintCheck::default(),
        })
    }

    /// Override the unique index checking mode
    pub fn with_constraint_check(mut self, check: ConstraintCheck) -> Self {
        self.constraint_check = check;
        self
    }

    /// Columns of the unique index, position last
    pub fn unique_columns(&self) -> Vec<&str> {
        self.scope_columns
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.position_column.as_str()))
            .collect()
    }
}
