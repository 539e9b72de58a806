//! Catalog: the set of tables plus row-id allocation
//!
//! The catalog is plain data. The concurrency layer owns it behind a lock,
//! copies a table before a transaction first writes to it, and puts the copy
//! back with `restore_table` on rollback.

use std::collections::BTreeMap;

use tracing::info;

use ordinal_core::{OrdinalError, RecordId, Result};

use crate::schema::TableSchema;
use crate::table::Table;

/// All tables of one database
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<String, Table>,
    next_id: u64,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table
    pub fn create_table(&mut self, schema: TableSchema) -> Result<()> {
        if self.tables.contains_key(&schema.name) {
            return Err(OrdinalError::TableExists(schema.name));
        }
        info!(
            target: "ordinal::storage",
            table = %schema.name,
            unique = ?schema.unique_columns(),
            check = ?schema.constraint_check,
            "Created sortable table"
        );
        self.tables.insert(schema.name.clone(), Table::new(schema));
        Ok(())
    }

    /// Table by name
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| OrdinalError::TableNotFound(name.to_string()))
    }

    /// Mutable table by name
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| OrdinalError::TableNotFound(name.to_string()))
    }

    /// Names of all tables
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Allocate a fresh row id
    ///
    /// Ids are unique across the catalog and never reused.
    pub fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId::new(self.next_id)
    }

    /// Replace a table with an earlier copy of itself
    pub fn restore_table(&mut self, table: Table) {
        self.tables.insert(table.schema().name.clone(), table);
    }

    /// Deferred constraint checks run at commit over the named tables
    pub fn check_deferred<'a, I>(&self, tables: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in tables {
            self.table(name)?.check_positive()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordinal_core::SortableConfig;

    fn schema(name: &str) -> TableSchema {
        TableSchema::from_config(name, &SortableConfig::new()).unwrap()
    }

    #[test]
    fn test_create_and_lookup_table() {
        let mut catalog = Catalog::new();
        catalog.create_table(schema("containers")).unwrap();
        assert!(catalog.table("containers").is_ok());
        assert_eq!(catalog.table_names(), vec!["containers"]);
        assert!(matches!(
            catalog.table("missing"),
            Err(OrdinalError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut catalog = Catalog::new();
        catalog.create_table(schema("t")).unwrap();
        assert!(matches!(
            catalog.create_table(schema("t")),
            Err(OrdinalError::TableExists(_))
        ));
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut catalog = Catalog::new();
        let a = catalog.allocate_id();
        let b = catalog.allocate_id();
        assert!(b > a);
    }

    #[test]
    fn test_deferred_positivity_check() {
        let mut catalog = Catalog::new();
        catalog.create_table(schema("t")).unwrap();
        let id = catalog.allocate_id();
        catalog
            .table_mut("t")
            .unwrap()
            .insert(id, BTreeMap::new(), Some(-1))
            .unwrap();
        assert!(catalog
            .check_deferred(["t"])
            .unwrap_err()
            .is_constraint_violation());
        assert!(catalog.check_deferred(std::iter::empty()).is_ok());
    }

    #[test]
    fn test_restore_table_replaces_rows() {
        let mut catalog = Catalog::new();
        catalog.create_table(schema("t")).unwrap();
        let before = catalog.table("t").unwrap().clone();
        let id = catalog.allocate_id();
        catalog
            .table_mut("t")
            .unwrap()
            .insert(id, BTreeMap::new(), Some(1))
            .unwrap();
        catalog.restore_table(before);
        assert!(catalog.table("t").unwrap().is_empty());
    }
}
