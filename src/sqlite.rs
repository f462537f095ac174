//! SQLite destination.

use crate::schema::quote_ident;
use crate::source::Value;
use anyhow::{Context, Result};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use std::path::{Path, PathBuf};

/// Statement cache size; one INSERT per table is live at a time
const STATEMENT_CACHE_CAPACITY: usize = 16;

/// Booleans are stored as 1/0, everything else binds as-is
impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Bool(b) => ToSqlOutput::Borrowed(ValueRef::Integer(i64::from(*b))),
            Value::Integer(n) => ToSqlOutput::Borrowed(ValueRef::Integer(*n)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// The SQLite file being written
pub struct SqliteDestination {
    conn: Connection,
    path: PathBuf,
    committed: usize,
}

impl SqliteDestination {
    /// Open (or create) the database file
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database {}", path.display()))?;
        Ok(Self::from_connection(conn, path.to_path_buf()))
    }

    /// Wrap an existing connection, e.g. an in-memory database
    pub fn from_connection(conn: Connection, path: PathBuf) -> Self {
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
        Self {
            conn,
            path,
            committed: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trade durability for speed and stop FK checks while tables are rebuilt
    pub fn configure_bulk_load(&self) -> Result<()> {
        self.conn
            .pragma_update(None, "foreign_keys", 0)
            .context("Failed to disable foreign keys")?;
        self.conn
            .pragma_update(None, "synchronous", 0)
            .context("Failed to set synchronous = OFF")?;
        let _mode: String = self
            .conn
            .pragma_update_and_check(None, "journal_mode", "MEMORY", |row| row.get(0))
            .context("Failed to set journal_mode = MEMORY")?;
        Ok(())
    }

    pub fn enable_foreign_keys(&self) -> Result<()> {
        self.conn
            .pragma_update(None, "foreign_keys", 1)
            .context("Failed to re-enable foreign keys")
    }

    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_ident(table)))
            .with_context(|| format!("Failed to drop table {}", table))
    }

    /// Run a DDL statement
    pub fn execute(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .with_context(|| format!("Failed to execute: {}", sql))
    }

    pub fn begin(&self) -> Result<()> {
        self.conn
            .execute_batch("BEGIN")
            .context("Failed to begin transaction")
    }

    pub fn commit(&mut self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .context("Failed to commit transaction")?;
        self.committed += 1;
        Ok(())
    }

    /// Transactions committed through this destination so far
    pub fn committed_transactions(&self) -> usize {
        self.committed
    }

    pub fn rollback(&self) -> Result<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .context("Failed to roll back transaction")
    }

    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Insert one row with a cached prepared statement
    pub fn insert_row(&self, sql: &str, values: &[Value]) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .with_context(|| format!("Failed to prepare: {}", sql))?;
        stmt.execute(params_from_iter(values.iter()))
            .with_context(|| format!("Failed to insert row: {}", sql))?;
        Ok(())
    }

    /// Number of rows in a destination table
    pub fn row_count(&self, table: &str) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
                [],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to count rows of {}", table))?;
        Ok(count as u64)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
