//! Table and column model for schema translation.
//!
//! This module provides:
//! - Data models for source tables and columns as introspected from MySQL
//! - MySQL → SQLite storage class mapping
//! - DEFAULT clause generation
//! - CREATE TABLE generation for the SQLite destination

mod ddl;
mod default;
mod types;

pub use ddl::{build_create_statement, build_insert_statement, quote_ident};
pub use default::build_default;
pub use types::map_type;

use std::fmt;

/// SQLite storage class a source column is mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Integer,
    Numeric,
    Blob,
    Text,
}

impl StorageClass {
    /// Keyword used in the generated column definition
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Integer => "INTEGER",
            StorageClass::Numeric => "NUMERIC",
            StorageClass::Blob => "BLOB",
            StorageClass::Text => "TEXT",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column as described by the source database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Full source type, e.g. `int(10) unsigned` or `varchar(255)`
    pub raw_type: String,
    /// Whether NULL is allowed
    pub nullable: bool,
    /// Raw default value, `None` when the column has no default
    pub raw_default: Option<String>,
    /// Column is part of the primary key
    pub is_primary_key: bool,
    /// Column is AUTO_INCREMENT
    pub is_auto_increment: bool,
}

impl ColumnDescriptor {
    /// Create a nullable, non-key column without a default
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            nullable: true,
            raw_default: None,
            is_primary_key: false,
            is_auto_increment: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.raw_default = Some(value.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Mark as AUTO_INCREMENT primary key (MySQL only allows it on a key column)
    pub fn auto_increment(mut self) -> Self {
        self.is_primary_key = true;
        self.is_auto_increment = true;
        self.nullable = false;
        self
    }

    /// Storage class of this column on the destination
    pub fn storage_class(&self) -> StorageClass {
        map_type(&self.raw_type)
    }
}

/// A source table with its columns in ordinal order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Column names in ordinal order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}
