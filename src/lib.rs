//! Ordinal - dense, unique, ordered positions for scoped records
//!
//! Records of a sortable table are partitioned into peer groups by their
//! scope attributes. Within a group, positions stay positive and unique, and
//! can be compacted back to 1..N at any time.
//!
//! # Quick Start
//!
//! ```ignore
//! use ordinal::{ContainerConfig, Database, Record, SortableConfig, SortableTable};
//!
//! let db = Database::new();
//! let config = SortableConfig::new().with_container(ContainerConfig::new("list", "list_id"));
//! let items = SortableTable::create(&db, "items", config)?;
//!
//! db.transaction(|txn| {
//!     let mut a = Record::new().with("list_id", 1);
//!     items.save(txn, &mut a, None)?;                      // a = 1
//!     let mut b = Record::new().with("list_id", 1).with_position(1);
//!     items.save(txn, &mut b, None)?;                      // b = 1, a = 2
//!     Ok(())
//! })?;
//! ```
//!
//! # Architecture
//!
//! - `ordinal-core`: records, config, errors and the `SortableRecord` /
//!   `PeerQuery` traits
//! - `ordinal-storage`: in-memory tables with a unique (scope, position) index
//! - `ordinal-concurrency`: `Database` and transactions
//! - `ordinal-engine`: the sequencer and `SortableTable`

pub use ordinal_concurrency::{Database, TableQuery, Transaction, TransactionStatus};
pub use ordinal_core::{
    Constraint, ContainerConfig, OrdinalError, PeerQuery, PositionUpdate, Record, RecordId,
    Result, ScopeFilter, SortableConfig, SortableRecord, Value, DEFAULT_POSITION_COLUMN,
};
pub use ordinal_engine::{
    Assignment, Compaction, Compactor, Navigator, PeerCache, PeerGroup, PeerGroupResolver,
    PositionAssigner, Sequencer, SortableTable,
};
pub use ordinal_storage::{ConstraintCheck, TableSchema, TableStats};
