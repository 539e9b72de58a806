//! Sequencing engine for ordinal
//!
//! This crate keeps positions dense, unique and ordered within peer groups:
//! - PeerGroupResolver: record → peer group, from the store or a loaded collection
//! - PositionAssigner: append or open a gap before a record is written
//! - Navigator: next/previous peer
//! - Compactor: renumber a group to 1..N
//! - Sequencer: the four operations behind one configured handle
//! - SortableTable: save/delete/find on top of a `Database` transaction
//!
//! Bulk renumbering always uses two statements: park every affected row on a
//! distinct negative position, then flip the sign. The store never sees two
//! rows of a group on the same position, whatever its constraint checking
//! mode.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assigner;
pub mod compactor;
pub mod navigator;
pub mod repository;
pub mod resolver;
pub mod sequencer;
mod shift;

#[cfg(test)]
mod testing;

pub use assigner::{Assignment, PositionAssigner};
pub use compactor::{Compaction, Compactor};
pub use navigator::Navigator;
pub use repository::SortableTable;
pub use resolver::{PeerCache, PeerGroup, PeerGroupResolver};
pub use sequencer::Sequencer;
