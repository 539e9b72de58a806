//! Core types and traits for ordinal
//!
//! This crate defines the foundational types used throughout the system:
//! - RecordId, ScopeFilter, ScopeKey: row identity and peer-group selection
//! - Value: column values for scope attributes
//! - Record: attribute bag with position and dirty tracking
//! - PositionUpdate: one bulk position statement
//! - SortableConfig: position column and scope declaration
//! - Error: error type hierarchy
//! - Traits: SortableRecord and PeerQuery, the engine's collaborator boundary

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod record;
pub mod traits;
pub mod types;
pub mod update;
pub mod value;

pub use config::{ContainerConfig, SortableConfig, DEFAULT_POSITION_COLUMN};
pub use error::{Constraint, OrdinalError, Result};
pub use record::Record;
pub use traits::{PeerQuery, SortableRecord};
pub use types::{RecordId, ScopeFilter, ScopeKey};
pub use update::{PositionAssignment, PositionSelection, PositionUpdate};
pub use value::Value;
