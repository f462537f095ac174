//! MySQL/MariaDB source over SQLx.
//!
//! SQLx is async; the exporter is not. Every call is driven to completion on
//! a private current-thread runtime, so there is only ever one query in
//! flight and nothing is spawned.

use super::{RowVisitor, Source, Value};
use crate::config::SourceConfig;
use crate::schema::{ColumnDescriptor, TableDefinition};
use anyhow::{Context, Result};
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo, ValueRef};
use tokio::runtime::Runtime;

const LIST_TABLES_SQL: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR(255)) AS table_name
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME
"#;

// CAST everything to CHAR/SIGNED: information_schema columns may come back
// as VARBINARY or INT depending on server version and collation.
const DESCRIBE_TABLE_SQL: &str = r#"
    SELECT
        CAST(COLUMN_NAME AS CHAR(255)) AS column_name,
        CAST(COLUMN_TYPE AS CHAR(255)) AS column_type,
        CAST(IF(IS_NULLABLE = 'YES', 1, 0) AS SIGNED) AS is_nullable,
        CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
        CAST(IF(COLUMN_KEY = 'PRI', 1, 0) AS SIGNED) AS is_primary,
        CAST(IF(EXTRA LIKE '%auto_increment%', 1, 0) AS SIGNED) AS is_identity
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

/// A single connection to a MySQL or MariaDB server
pub struct MySqlSource {
    runtime: Runtime,
    conn: MySqlConnection,
    database: String,
    mariadb: bool,
}

impl MySqlSource {
    /// Connect to the server described by `config`
    pub fn connect(config: &SourceConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start I/O runtime")?;

        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.username)
            .charset("utf8mb4");
        if let Some(ref password) = config.password {
            options = options.password(password);
        }

        let mut conn = runtime
            .block_on(options.connect())
            .with_context(|| format!("Failed to connect to MySQL at {}", config.display_target()))?;

        let version: String = runtime
            .block_on(sqlx::query_scalar("SELECT CAST(VERSION() AS CHAR)").fetch_one(&mut conn))
            .context("Failed to query server version")?;

        Ok(Self {
            runtime,
            conn,
            database: config.database.clone(),
            mariadb: version.to_lowercase().contains("mariadb"),
        })
    }

    /// Close the connection cleanly
    pub fn close(self) -> Result<()> {
        self.runtime
            .block_on(self.conn.close())
            .context("Failed to close MySQL connection")
    }

    fn table_ref(&self, table: &str) -> String {
        format!("{}.{}", quote_ident(&self.database), quote_ident(table))
    }
}

impl Source for MySqlSource {
    fn list_tables(&mut self) -> Result<Vec<String>> {
        self.runtime
            .block_on(
                sqlx::query_scalar::<_, String>(LIST_TABLES_SQL)
                    .bind(&self.database)
                    .fetch_all(&mut self.conn),
            )
            .with_context(|| format!("Failed to list tables of '{}'", self.database))
    }

    fn describe_table(&mut self, table: &str) -> Result<TableDefinition> {
        let rows: Vec<MySqlRow> = self
            .runtime
            .block_on(
                sqlx::query(DESCRIBE_TABLE_SQL)
                    .bind(&self.database)
                    .bind(table)
                    .fetch_all(&mut self.conn),
            )
            .with_context(|| format!("Failed to describe table '{}'", table))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let raw_default: Option<String> = row.try_get("column_default")?;
            columns.push(ColumnDescriptor {
                name: row.try_get("column_name")?,
                raw_type: row.try_get("column_type")?,
                nullable: row.try_get::<i64, _>("is_nullable")? == 1,
                raw_default: if self.mariadb {
                    normalize_mariadb_default(raw_default)
                } else {
                    raw_default
                },
                is_primary_key: row.try_get::<i64, _>("is_primary")? == 1,
                is_auto_increment: row.try_get::<i64, _>("is_identity")? == 1,
            });
        }

        Ok(TableDefinition::new(table, columns))
    }

    fn count_rows(&mut self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table_ref(table));
        let count: i64 = self
            .runtime
            .block_on(sqlx::query_scalar(&sql).fetch_one(&mut self.conn))
            .with_context(|| format!("Failed to count rows of '{}'", table))?;
        Ok(count.max(0) as u64)
    }

    fn stream_rows(&mut self, table: &str, visit: &mut RowVisitor<'_>) -> Result<()> {
        let sql = format!("SELECT * FROM {}", self.table_ref(table));
        let conn = &mut self.conn;

        // raw_sql goes over the text protocol, so every cell arrives as its
        // textual representation and decodes losslessly as a string.
        self.runtime.block_on(async {
            let mut rows = sqlx::raw_sql(&sql).fetch(conn);
            let mut columns: Option<Vec<String>> = None;

            while let Some(row) = rows
                .try_next()
                .await
                .with_context(|| format!("Failed to read rows of '{}'", table))?
            {
                let names = columns.get_or_insert_with(|| {
                    row.columns().iter().map(|c| c.name().to_string()).collect()
                });
                let values = (0..names.len())
                    .map(|idx| decode_value(&row, idx))
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("Failed to decode row of '{}'", table))?;
                visit(names, values)?;
            }

            Ok::<(), anyhow::Error>(())
        })
    }
}

/// Quote a MySQL identifier.
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// How a result column's cells are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Integer,
    Real,
    Blob,
    Text,
}

/// Pick the decoding for a column from its SQLx type name.
///
/// SQLx names `tinyint(1)` columns `BOOLEAN`, but they hold any signed byte,
/// so they decode as integers like every other integer type.
fn value_kind(type_name: &str) -> ValueKind {
    let t = type_name.to_uppercase();
    match t.as_str() {
        "BOOLEAN" | "YEAR" => ValueKind::Integer,
        "FLOAT" | "DOUBLE" => ValueKind::Real,
        "BIT" | "GEOMETRY" => ValueKind::Blob,
        t if t.contains("INT") => ValueKind::Integer,
        t if t.contains("BLOB") || t.contains("BINARY") => ValueKind::Blob,
        _ => ValueKind::Text,
    }
}

/// Convert one cell of a text-protocol row into a [`Value`]
fn decode_value(row: &MySqlRow, idx: usize) -> Result<Value> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match value_kind(raw.type_info().name()) {
        ValueKind::Integer => integer_from_text(&row.try_get_unchecked::<String, _>(idx)?)?,
        ValueKind::Real => Value::Real(row.try_get_unchecked::<f64, _>(idx)?),
        ValueKind::Blob => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        ValueKind::Text => match row.try_get_unchecked::<String, _>(idx) {
            Ok(s) => Value::Text(s),
            Err(_) => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        },
    };

    Ok(value)
}

/// Parse a textual integer cell; values past `i64::MAX` (BIGINT UNSIGNED)
/// are kept as text so no digits are lost.
fn integer_from_text(text: &str) -> Result<Value> {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return Ok(Value::Integer(v));
    }
    if text.parse::<u64>().is_ok() {
        return Ok(Value::Text(text.to_string()));
    }
    anyhow::bail!("Invalid integer value '{}'", text)
}

/// MariaDB reports defaults as SQL expressions: `NULL` for no default and
/// string literals in quotes. Bring them to MySQL's raw form.
fn normalize_mariadb_default(raw: Option<String>) -> Option<String> {
    let value = raw?;
    if value.eq_ignore_ascii_case("NULL") {
        return None;
    }
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        let inner = &value[1..value.len() - 1];
        return Some(inner.replace("''", "'").replace("\\'", "'"));
    }
    Some(value)
}
