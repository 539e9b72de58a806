//! Identifiers and peer-group filters
//!
//! - RecordId: store-assigned row identity
//! - ScopeFilter: equality conditions selecting one peer group
//! - ScopeKey: the bare scope values, in filter order, used as an index key

use std::fmt;

use smallvec::SmallVec;

use crate::value::Value;

/// Store-assigned identity of a persisted row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(u64);

impl RecordId {
    /// Wrap a raw id
    pub fn new(raw: u64) -> Self {
        RecordId(raw)
    }

    /// Raw id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scope values of one peer group, in scope-attribute order
///
/// Most groups are scoped by a single foreign key (or a polymorphic
/// type/key pair), hence the inline capacity of two.
pub type ScopeKey = SmallVec<[Value; 2]>;

/// Equality conditions that select a peer group
///
/// An empty filter selects every row: one global peer group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeFilter {
    conditions: SmallVec<[(String, Value); 2]>,
}

impl ScopeFilter {
    /// Filter matching every row
    pub fn global() -> Self {
        Self::default()
    }

    /// Add an `attribute = value` condition
    pub fn and(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(attribute, value);
        self
    }

    /// Add an `attribute = value` condition in place
    pub fn push(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.conditions.push((attribute.into(), value.into()));
    }

    /// The conditions, in insertion order
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Value required for `attribute`, if the filter constrains it
    pub fn value_of(&self, attribute: &str) -> Option<&Value> {
        self.conditions
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, v)| v)
    }

    /// True when the filter selects the single global group
    pub fn is_global(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The filter's values as an index key, in insertion order
    pub fn key(&self) -> ScopeKey {
        self.conditions.iter().map(|(_, v)| v.clone()).collect()
    }
}

impl fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "<global>");
        }
        for (i, (name, value)) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{} = {}", name, value)?;
        }
        Ok(())
    }
}
