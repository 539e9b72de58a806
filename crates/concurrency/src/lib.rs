//! Concurrency layer for ordinal
//!
//! This crate implements the transaction boundary the sequencing engine runs in:
//! - Database: catalog behind a lock, closure-based transactions
//! - Transaction: scoped writes, deferred checks at commit, rollback on drop
//! - TableQuery: the `PeerQuery` implementation for one table
//!
//! Writers are serialized by the catalog lock, so the peer group being
//! renumbered cannot change underneath a transaction.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod transaction;

pub use database::Database;
pub use transaction::{TableQuery, Transaction, TransactionStatus};
