//! Storage layer for ordinal
//!
//! This crate implements the in-memory relational store sortable records live in:
//! - Catalog: tables by name plus row-id allocation
//! - Table: rows, reads ordered by position, bulk position updates
//! - UniqueIndex: the (scope, position) unique constraint
//! - TableSchema: scope columns, position column, constraint checking mode
//!
//! The store enforces uniqueness on every statement and NOT NULL on every
//! write. Positivity is a deferred check run at commit.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod index;
pub mod schema;
pub mod table;

pub use catalog::Catalog;
pub use index::UniqueIndex;
pub use schema::{ConstraintCheck, TableSchema};
pub use table::{Table, TableStats};
