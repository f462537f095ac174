//! Source database access.
//!
//! The exporter only talks to the [`Source`] trait. [`MySqlSource`] reads a
//! live MySQL/MariaDB server; [`MemorySource`] serves fixed tables from memory.

mod memory;
mod mysql;

pub use memory::MemorySource;
pub use mysql::MySqlSource;

use crate::schema::TableDefinition;
use anyhow::Result;

/// A single cell read from the source.
///
/// Booleans are kept distinct here and become 1/0 when bound on the SQLite side.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Callback receiving each streamed row: the result's column names (same
/// slice for every row of a table) and the row's values in that order.
pub type RowVisitor<'a> = dyn FnMut(&[String], Vec<Value>) -> Result<()> + 'a;

/// Read access to the database being exported
pub trait Source {
    /// Base tables of the exported schema, alphabetically ordered
    fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Columns of a table in ordinal order
    fn describe_table(&mut self, table: &str) -> Result<TableDefinition>;

    /// Number of rows currently in the table
    fn count_rows(&mut self, table: &str) -> Result<u64>;

    /// Stream every row of `SELECT *` to the visitor, one row at a time.
    ///
    /// Implementations must not buffer the whole table. An error returned by
    /// the visitor stops the stream and is returned unchanged.
    fn stream_rows(&mut self, table: &str, visit: &mut RowVisitor<'_>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(5i64), Value::Integer(5));
        assert_eq!(Value::from("x"), Value::Text("x".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(true)), Value::Bool(true));
        assert!(Value::Null.is_null());
        assert!(!Value::Integer(0).is_null());
    }
}
