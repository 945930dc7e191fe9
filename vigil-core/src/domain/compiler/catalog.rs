// vigil-core/src/domain/compiler/catalog.rs

use std::collections::BTreeMap;

use crate::domain::error::CompileError;

/// Columns of one table, in their declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

impl TableSchema {
    /// Resolves a column name case-insensitively and returns the catalog spelling.
    pub fn resolve_column(&self, name: &str) -> Result<&str, CompileError> {
        self.columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .map(String::as_str)
            .ok_or_else(|| CompileError::UnknownIdentifier(format!("{}.{}", self.name, name)))
    }
}

/// Allow-list of identifiers a rule may reference.
///
/// Only names present here are ever embedded in generated SQL, and always in the
/// catalog's own spelling rather than the rule's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from `(table, column)` pairs already sorted by ordinal position.
    pub fn from_columns<I, T, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: Into<String>,
    {
        let mut catalog = Self::new();
        for (table, column) in pairs {
            let table = table.into();
            catalog
                .tables
                .entry(table.to_lowercase())
                .or_insert_with(|| TableSchema {
                    name: table,
                    columns: Vec::new(),
                })
                .columns
                .push(column.into());
        }
        catalog
    }

    pub fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
        self.tables.insert(
            table.to_lowercase(),
            TableSchema {
                name: table.to_string(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
            },
        );
        self
    }

    /// Drops tables a rule must never target (the bookkeeping tables).
    pub fn without_tables(mut self, excluded: &[&str]) -> Self {
        for table in excluded {
            self.tables.remove(&table.to_lowercase());
        }
        self
    }

    pub fn table(&self, name: &str) -> Result<&TableSchema, CompileError> {
        self.tables
            .get(&name.to_lowercase())
            .filter(|t| !t.columns.is_empty())
            .ok_or_else(|| CompileError::UnknownIdentifier(name.to_string()))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.values().map(|t| t.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
