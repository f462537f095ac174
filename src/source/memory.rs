//! In-memory source, used for tests and benches.

use super::{RowVisitor, Source, Value};
use crate::schema::TableDefinition;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct MemoryTable {
    definition: TableDefinition,
    rows: Vec<Vec<Value>>,
    /// Column names exposed by the row stream, when they differ from the definition
    projection: Option<Vec<String>>,
    /// Row count reported by `count_rows`, when it differs from `rows.len()`
    reported_count: Option<u64>,
}

/// A [`Source`] serving tables held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: BTreeMap<String, MemoryTable>,
    streamed: Vec<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with its rows (values in definition column order)
    pub fn with_table(mut self, definition: TableDefinition, rows: Vec<Vec<Value>>) -> Self {
        self.tables.insert(
            definition.name.clone(),
            MemoryTable {
                definition,
                rows,
                projection: None,
                reported_count: None,
            },
        );
        self
    }

    /// Make the row stream of `table` expose different column names
    pub fn with_projection(mut self, table: &str, columns: Vec<String>) -> Self {
        if let Some(t) = self.tables.get_mut(table) {
            t.projection = Some(columns);
        }
        self
    }

    /// Make `count_rows` report `count` regardless of the stored rows
    pub fn with_reported_count(mut self, table: &str, count: u64) -> Self {
        if let Some(t) = self.tables.get_mut(table) {
            t.reported_count = Some(count);
        }
        self
    }

    /// Tables whose rows were requested, in request order
    pub fn streamed_tables(&self) -> &[String] {
        &self.streamed
    }

    fn table(&self, name: &str) -> Result<&MemoryTable> {
        self.tables
            .get(name)
            .ok_or_else(|| anyhow!("Table '{}' doesn't exist", name))
    }
}

impl Source for MemorySource {
    fn list_tables(&mut self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn describe_table(&mut self, table: &str) -> Result<TableDefinition> {
        Ok(self.table(table)?.definition.clone())
    }

    fn count_rows(&mut self, table: &str) -> Result<u64> {
        let t = self.table(table)?;
        Ok(t.reported_count.unwrap_or(t.rows.len() as u64))
    }

    fn stream_rows(&mut self, table: &str, visit: &mut RowVisitor<'_>) -> Result<()> {
        self.streamed.push(table.to_string());
        let t = self.table(table)?;
        let columns: Vec<String> = match &t.projection {
            Some(cols) => cols.clone(),
            None => t.definition.columns.iter().map(|c| c.name.clone()).collect(),
        };

        for row in &t.rows {
            visit(&columns, row.clone())?;
        }
        Ok(())
    }
}
