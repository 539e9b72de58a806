//! Record: an attribute bag with a position and dirty tracking
//!
//! `Record` is the row type the bundled store materializes. It keeps a copy
//! of its last-persisted state so callers can ask what changed since the last
//! load or save, which is what decides whether sequencing needs to run.

use std::collections::BTreeMap;

use crate::traits::SortableRecord;
use crate::types::RecordId;
use crate::value::Value;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq)]
struct PersistedState {
    attributes: BTreeMap<String, Value>,
    position: Option<i64>,
}

/// A row of a sortable table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    id: Option<RecordId>,
    attributes: BTreeMap<String, Value>,
    position: Option<i64>,
    persisted: Option<PersistedState>,
}

impl Record {
    /// A new, unsaved record with no attributes and no position
    pub fn new() -> Self {
        Self::default()
    }

    /// A clean record as read from the store
    pub fn loaded(id: RecordId, attributes: BTreeMap<String, Value>, position: i64) -> Self {
        Self {
            id: Some(id),
            persisted: Some(PersistedState {
                attributes: attributes.clone(),
                position: Some(position),
            }),
            attributes,
            position: Some(position),
        }
    }

    /// Builder-style attribute assignment
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(attribute, value);
        self
    }

    /// Builder-style position assignment
    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    /// Set an attribute
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    /// Attribute value; `Null` when never set
    pub fn get(&self, attribute: &str) -> &Value {
        self.attributes.get(attribute).unwrap_or(&NULL)
    }

    /// All attributes
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Store identity
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// True until the record is first saved
    pub fn is_new_record(&self) -> bool {
        self.persisted.is_none()
    }

    /// Current position
    pub fn position(&self) -> Option<i64> {
        self.position
    }

    /// Overwrite the position
    pub fn set_position(&mut self, position: i64) {
        self.position = Some(position);
    }

    /// Position as last persisted
    pub fn persisted_position(&self) -> Option<i64> {
        self.persisted.as_ref().and_then(|p| p.position)
    }

    /// Names of attributes whose value differs from the persisted state
    ///
    /// For a new record this is every attribute that holds a non-null value.
    pub fn changed_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, value) in &self.attributes {
            let before = match &self.persisted {
                Some(p) => p.attributes.get(name).unwrap_or(&NULL),
                None => &NULL,
            };
            if before != value {
                names.push(name.as_str());
            }
        }
        if let Some(p) = &self.persisted {
            for (name, value) in &p.attributes {
                if !value.is_null() && !self.attributes.contains_key(name) {
                    names.push(name.as_str());
                }
            }
        }
        names
    }

    /// True if any attribute or the position differs from the persisted state
    pub fn is_dirty(&self) -> bool {
        self.position_changed() || !self.changed_attributes().is_empty()
    }

    /// Record a successful save under `id`: the current state becomes the persisted state
    pub fn changes_applied(&mut self, id: RecordId) {
        self.id = Some(id);
        self.persisted = Some(PersistedState {
            attributes: self.attributes.clone(),
            position: self.position,
        });
    }
}

impl SortableRecord for Record {
    fn record_id(&self) -> Option<RecordId> {
        self.id
    }

    fn scope_value(&self, attribute: &str) -> Value {
        self.get(attribute).clone()
    }

    fn scope_changed(&self, attribute: &str) -> bool {
        match &self.persisted {
            Some(p) => p.attributes.get(attribute).unwrap_or(&NULL) != self.get(attribute),
            None => false,
        }
    }

    fn position(&self) -> Option<i64> {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = Some(position);
    }

    fn position_changed(&self) -> bool {
        match &self.persisted {
            Some(p) => p.position != self.position,
            None => self.position.is_some(),
        }
    }

    fn clear_position_change(&mut self) {
        if let Some(p) = &mut self.persisted {
            p.position = self.position;
        }
    }
}
