//! Sortable configuration
//!
//! Declares which column holds the position and which attributes partition
//! records into peer groups. Can be written by hand or loaded from TOML:
//!
//! ```toml
//! # Position column (default: "sort_position")
//! on = "sort_position"
//!
//! # Explicit scope attributes. Leave empty to derive the scope from the
//! # container, or to keep a single global peer group.
//! scope = []
//!
//! # [container]
//! # name = "container"
//! # foreign_key = "container_id"
//! # foreign_type = "container_type"   # polymorphic containers only
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OrdinalError, Result};

/// Default position column name
pub const DEFAULT_POSITION_COLUMN: &str = "sort_position";

fn default_position_column() -> String {
    DEFAULT_POSITION_COLUMN.to_string()
}

/// The entity that owns a peer group as a collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Name of the container association
    pub name: String,
    /// Attribute on the record holding the container's id
    pub foreign_key: String,
    /// Attribute holding the container's type, for polymorphic containers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_type: Option<String>,
}

impl ContainerConfig {
    /// Container referenced through `foreign_key`
    pub fn new(name: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            foreign_key: foreign_key.into(),
            foreign_type: None,
        }
    }

    /// Mark the container as polymorphic, typed by `foreign_type`
    pub fn polymorphic(mut self, foreign_type: impl Into<String>) -> Self {
        self.foreign_type = Some(foreign_type.into());
        self
    }
}

/// Position column and peer-group declaration for one record type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortableConfig {
    /// Column holding the position
    #[serde(default = "default_position_column")]
    pub on: String,
    /// Explicit scope attributes
    #[serde(default)]
    pub scope: Vec<String>,
    /// Owning container, if records belong to one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerConfig>,
}

impl Default for SortableConfig {
    fn default() -> Self {
        Self {
            on: default_position_column(),
            scope: Vec::new(),
            container: None,
        }
    }
}

impl SortableConfig {
    /// One global peer group ordered by `sort_position`
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `column` as the position column
    pub fn on(mut self, column: impl Into<String>) -> Self {
        self.on = column.into();
        self
    }

    /// Partition by the given attributes
    pub fn with_scope<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Records belong to `container`
    pub fn with_container(mut self, container: ContainerConfig) -> Self {
        self.container = Some(container);
        self
    }

    /// Attributes whose combined values define a peer group
    ///
    /// The explicit scope wins. Without one, a container contributes its
    /// `[foreign_type, foreign_key]` (polymorphic) or `[foreign_key]`.
    pub fn scope_attributes(&self) -> Vec<String> {
        if !self.scope.is_empty() {
            return self.scope.clone();
        }
        match &self.container {
            Some(c) => {
                let mut attributes = Vec::with_capacity(2);
                if let Some(t) = &c.foreign_type {
                    attributes.push(t.clone());
                }
                attributes.push(c.foreign_key.clone());
                attributes
            }
            None => Vec::new(),
        }
    }

    /// Reject configurations the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.on.trim().is_empty() {
            return Err(OrdinalError::Config("position column name is empty".to_string()));
        }
        let scope = self.scope_attributes();
        if scope.iter().any(|s| s == &self.on) {
            return Err(OrdinalError::Config(format!(
                "position column '{}' cannot also be a scope attribute",
                self.on
            )));
        }
        for (i, s) in scope.iter().enumerate() {
            if scope[..i].contains(s) {
                return Err(OrdinalError::Config(format!(
                    "scope attribute '{}' listed twice",
                    s
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SortableConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            OrdinalError::Config(msg) => {
                OrdinalError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
