//! Error types for ordinal
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Store rejections are surfaced unchanged: nothing in the workspace retries a
//! failed write. Retry policy belongs to whoever owns the transaction boundary.

use std::fmt;
use std::io;
use thiserror::Error;

use crate::types::RecordId;

/// Result type alias for ordinal operations
pub type Result<T> = std::result::Result<T, OrdinalError>;

/// The store-side constraint a write ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Unique index over (scope columns, position column)
    Unique,
    /// Deferred `position > 0` check, evaluated at commit
    Positive,
    /// The position column is NOT NULL
    NotNull,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Unique => write!(f, "unique"),
            Constraint::Positive => write!(f, "positive"),
            Constraint::NotNull => write!(f, "not null"),
        }
    }
}

/// Error types for ordinal
#[derive(Debug, Error)]
pub enum OrdinalError {
    /// The store rejected a write that would break one of its constraints
    #[error("{constraint} constraint violated on table '{table}': {detail}")]
    ConstraintViolation {
        /// Table the write targeted
        table: String,
        /// Which constraint fired
        constraint: Constraint,
        /// Human-readable description of the offending row
        detail: String,
    },

    /// Table does not exist
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Table already exists
    #[error("Table already exists: {0}")]
    TableExists(String),

    /// No row with this id in the table
    #[error("Record {id} not found in table '{table}'")]
    RecordNotFound {
        /// Table searched
        table: String,
        /// Missing record id
        id: RecordId,
    },

    /// Navigation was asked for on a record that has no position yet
    #[error("Record has no position")]
    Unpositioned,

    /// Transaction is no longer usable
    #[error("Transaction not active: {state}")]
    TransactionNotActive {
        /// State the transaction was found in
        state: String,
    },

    /// Caller supplied something the operation cannot accept
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while reading or writing configuration
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl OrdinalError {
    /// Build an `InvalidInput` error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        OrdinalError::InvalidInput(message.into())
    }

    /// Build a `Storage` error
    pub fn storage(message: impl Into<String>) -> Self {
        OrdinalError::Storage(message.into())
    }

    /// Build a `ConstraintViolation` error
    pub fn constraint(
        table: impl Into<String>,
        constraint: Constraint,
        detail: impl Into<String>,
    ) -> Self {
        OrdinalError::ConstraintViolation {
            table: table.into(),
            constraint,
            detail: detail.into(),
        }
    }

    /// True when the store rejected a write on one of its constraints
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, OrdinalError::ConstraintViolation { .. })
    }

    /// The constraint that fired, if this is a constraint violation
    pub fn violated_constraint(&self) -> Option<Constraint> {
        match self {
            OrdinalError::ConstraintViolation { constraint, .. } => Some(*constraint),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for OrdinalError {
    fn from(e: toml::de::Error) -> Self {
        OrdinalError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for OrdinalError {
    fn from(e: toml::ser::Error) -> Self {
        OrdinalError::Config(e.to_string())
    }
}
