//! Table-by-table export from a [`Source`] into a SQLite file.
//!
//! For every table, strictly one after another:
//!
//! 1. drop the destination table
//! 2. recreate it from the source column description
//! 3. unless the table matches an ignore pattern, stream its rows into it
//!    inside a single transaction
//!
//! Schema problems local to one table are reported and skipped. Write
//! failures abort the whole run after rolling back the open transaction.

mod stats;

pub use stats::{ExportStats, SkipReason, TableOutcome, TablePlan};

use crate::config::prepare_output_path;
use crate::progress::{row_bar, Progress};
use crate::schema::{build_create_statement, build_insert_statement, TableDefinition};
use crate::selector::{filter_tables, IgnoreMatcher};
use crate::source::Source;
use crate::sqlite::SqliteDestination;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

/// Everything the exporter needs besides the source connection
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    /// Destination SQLite file
    pub output: PathBuf,
    /// Tables matching any of these `%` patterns get schema only
    pub ignore: Vec<String>,
    /// Only export these tables (empty = all)
    pub tables: Vec<String>,
    /// Show a row progress bar per table
    pub progress: bool,
}

/// Drives an export run
pub struct Exporter {
    config: ExportConfig,
    matcher: IgnoreMatcher,
}

impl Exporter {
    /// Create an exporter, compiling the ignore patterns once
    pub fn new(config: ExportConfig) -> Result<Self> {
        let matcher = IgnoreMatcher::new(&config.ignore)?;
        Ok(Self { config, matcher })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Open the configured output file and export into it
    pub fn run(&self, source: &mut dyn Source, progress: &mut dyn Progress) -> Result<ExportStats> {
        prepare_output_path(&self.config.output)?;
        let mut dest = SqliteDestination::open(&self.config.output)?;
        self.export_into(source, &mut dest, progress)
    }

    /// Export into an already opened destination
    pub fn export_into(
        &self,
        source: &mut dyn Source,
        dest: &mut SqliteDestination,
        progress: &mut dyn Progress,
    ) -> Result<ExportStats> {
        let start = Instant::now();
        let committed_before = dest.committed_transactions();
        let mut stats = ExportStats::new(dest.path().to_path_buf());

        let tables = self.select_tables(source, progress)?;
        stats.tables_found = tables.len();

        if tables.is_empty() {
            progress.line("No tables found");
            stats.duration_secs = start.elapsed().as_secs_f64();
            return Ok(stats);
        }

        dest.configure_bulk_load()?;

        let total = tables.len();
        for (idx, table) in tables.iter().enumerate() {
            progress.line(&format!("[{}/{}] Exporting {}", idx + 1, total, table));
            let outcome = self.export_table(source, dest, table, progress)?;
            stats.record(outcome);
        }

        dest.enable_foreign_keys()?;

        stats.transactions = dest.committed_transactions() - committed_before;
        stats.duration_secs = start.elapsed().as_secs_f64();
        Ok(stats)
    }

    /// Describe what an export would do without touching any destination
    pub fn plan(&self, source: &mut dyn Source, progress: &mut dyn Progress) -> Result<Vec<TablePlan>> {
        let tables = self.select_tables(source, progress)?;
        let mut plans = Vec::with_capacity(tables.len());

        for table in tables {
            let ignored_by = self.matcher.matching_pattern(&table).map(str::to_string);
            let rows = source.count_rows(&table)?;
            plans.push(TablePlan {
                table,
                copy_data: ignored_by.is_none(),
                ignored_by,
                rows,
            });
        }

        Ok(plans)
    }

    fn select_tables(&self, source: &mut dyn Source, progress: &mut dyn Progress) -> Result<Vec<String>> {
        let tables = source.list_tables()?;
        let (tables, missing) = filter_tables(tables, &self.config.tables);
        for name in missing {
            progress.line(&format!("  Skipping {}: table not found in source", name));
        }
        Ok(tables)
    }

    fn export_table(
        &self,
        source: &mut dyn Source,
        dest: &mut SqliteDestination,
        table: &str,
        progress: &mut dyn Progress,
    ) -> Result<TableOutcome> {
        dest.drop_table(table)?;

        let definition = source.describe_table(table)?;
        let Some(create_sql) = build_create_statement(&definition) else {
            progress.line(&format!("  Skipping {}: no columns found", table));
            return Ok(TableOutcome::skipped(table, false, SkipReason::NoColumns));
        };
        dest.execute(&create_sql)?;

        if let Some(pattern) = self.matcher.matching_pattern(table) {
            progress.line(&format!(
                "  Schema only for {} (matches ignore pattern '{}')",
                table, pattern
            ));
            return Ok(TableOutcome::skipped(
                table,
                true,
                SkipReason::Ignored(pattern.to_string()),
            ));
        }

        let count = source.count_rows(table)?;
        if count == 0 {
            return Ok(TableOutcome::skipped(table, true, SkipReason::NoRows));
        }

        let bar = self.config.progress.then(|| row_bar(count));
        let result = copy_rows(source, dest, &definition, bar.as_ref());
        if let Some(pb) = bar {
            pb.finish_and_clear();
        }

        let copied = result?;
        if copied == 0 {
            return Ok(TableOutcome::skipped(table, true, SkipReason::NoRows));
        }
        Ok(TableOutcome::copied(table, copied))
    }
}

/// Stream every row of `table` into the destination within one transaction.
///
/// The transaction is opened on the first row, so a stream that yields
/// nothing leaves the destination untouched. Returns the number of rows
/// written.
fn copy_rows(
    source: &mut dyn Source,
    dest: &mut SqliteDestination,
    table: &TableDefinition,
    bar: Option<&indicatif::ProgressBar>,
) -> Result<u64> {
    let mut insert_sql: Option<String> = None;
    let mut copied: u64 = 0;

    let mut visit = |columns: &[String], values: Vec<crate::source::Value>| -> Result<()> {
        if insert_sql.is_none() {
            verify_columns(table, columns)?;
            dest.begin()?;
        }
        let sql = insert_sql.get_or_insert_with(|| build_insert_statement(&table.name, columns));
        dest.insert_row(sql, &values)?;

        copied += 1;
        if let Some(pb) = bar {
            pb.inc(1);
        }
        Ok(())
    };

    let streamed = source.stream_rows(&table.name, &mut visit);

    if insert_sql.is_none() {
        streamed?;
        return Ok(0);
    }

    match streamed.and_then(|_| dest.commit()) {
        Ok(()) => Ok(copied),
        Err(e) => {
            if dest.in_transaction() {
                let _ = dest.rollback();
            }
            Err(e).with_context(|| format!("Failed to copy rows of {}", table.name))
        }
    }
}

/// The result's column names must be exactly the described columns;
/// a positional insert would silently misalign values otherwise.
fn verify_columns(table: &TableDefinition, columns: &[String]) -> Result<()> {
    let described: BTreeSet<&str> = table.column_names().into_iter().collect();
    let streamed: BTreeSet<&str> = columns.iter().map(String::as_str).collect();

    if described == streamed && columns.len() == table.columns.len() {
        return Ok(());
    }

    let missing: Vec<&str> = described.difference(&streamed).copied().collect();
    let unexpected: Vec<&str> = streamed.difference(&described).copied().collect();
    anyhow::bail!(
        "Column mismatch for table {}: described but not returned [{}], returned but not described [{}]",
        table.name,
        missing.join(", "),
        unexpected.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDescriptor;
    use crate::source::{MemorySource, Value};
    use rusqlite::Connection;

    fn memory_dest() -> SqliteDestination {
        SqliteDestination::from_connection(
            Connection::open_in_memory().unwrap(),
            PathBuf::from(":memory:"),
        )
    }

    fn exporter(ignore: &[&str]) -> Exporter {
        Exporter::new(ExportConfig {
            ignore: ignore.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
        .unwrap()
    }

    fn users() -> TableDefinition {
        TableDefinition::new(
            "users",
            vec![
                ColumnDescriptor::new("id", "int(10) unsigned").auto_increment(),
                ColumnDescriptor::new("name", "varchar(255)").not_null(),
                ColumnDescriptor::new("admin", "tinyint(1)").not_null().with_default("0"),
            ],
        )
    }

    fn user_rows() -> Vec<Vec<Value>> {
        vec![
            vec![1i64.into(), "Ada".into(), true.into()],
            vec![2i64.into(), "Linus".into(), false.into()],
        ]
    }

    #[test]
    fn test_no_tables() {
        let mut source = MemorySource::new();
        let mut dest = memory_dest();
        let mut lines: Vec<String> = Vec::new();

        let stats = exporter(&[])
            .export_into(&mut source, &mut dest, &mut lines)
            .unwrap();

        assert_eq!(stats.tables_found, 0);
        assert!(stats.tables.is_empty());
        assert_eq!(lines, vec!["No tables found"]);
    }

    #[test]
    fn test_copies_rows_and_normalizes_bools() {
        let mut source = MemorySource::new().with_table(users(), user_rows());
        let mut dest = memory_dest();
        let mut lines: Vec<String> = Vec::new();

        let stats = exporter(&[])
            .export_into(&mut source, &mut dest, &mut lines)
            .unwrap();

        assert_eq!(stats.rows_copied, 2);
        assert_eq!(stats.transactions, 1);
        assert_eq!(dest.committed_transactions(), 1);
        assert_eq!(lines[0], "[1/1] Exporting users");

        let admins: i64 = dest
            .connection()
            .query_row("SELECT SUM(admin) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(admins, 1);
    }

    #[test]
    fn test_ignored_table_gets_schema_only() {
        let mut source = MemorySource::new().with_table(users(), user_rows());
        let mut dest = memory_dest();
        let mut lines: Vec<String> = Vec::new();

        let stats = exporter(&["USERS"])
            .export_into(&mut source, &mut dest, &mut lines)
            .unwrap();

        assert_eq!(dest.row_count("users").unwrap(), 0);
        assert_eq!(stats.schemas_created, 1);
        assert_eq!(stats.transactions, 0);
        assert!(source.streamed_tables().is_empty());
        assert_eq!(
            stats.tables[0].skipped,
            Some(SkipReason::Ignored("USERS".to_string()))
        );
    }

    #[test]
    fn test_table_without_columns_is_skipped() {
        let mut source = MemorySource::new()
            .with_table(TableDefinition::new("broken", vec![]), vec![])
            .with_table(users(), user_rows());
        let mut dest = memory_dest();
        let mut lines: Vec<String> = Vec::new();

        let stats = exporter(&[])
            .export_into(&mut source, &mut dest, &mut lines)
            .unwrap();

        assert_eq!(stats.tables[0].skipped, Some(SkipReason::NoColumns));
        assert!(!stats.tables[0].schema_created);
        assert!(lines.iter().any(|l| l.contains("Skipping broken: no columns found")));
        assert_eq!(dest.row_count("users").unwrap(), 2);
    }

    #[test]
    fn test_empty_table_opens_no_transaction() {
        let mut source = MemorySource::new().with_table(users(), vec![]);
        let mut dest = memory_dest();
        let mut lines: Vec<String> = Vec::new();

        let stats = exporter(&[])
            .export_into(&mut source, &mut dest, &mut lines)
            .unwrap();

        assert_eq!(stats.transactions, 0);
        assert_eq!(stats.tables[0].skipped, Some(SkipReason::NoRows));
        assert!(stats.tables[0].schema_created);
        assert!(source.streamed_tables().is_empty());
        assert!(!dest.in_transaction());
    }

    #[test]
    fn test_empty_stream_despite_count() {
        let mut source = MemorySource::new()
            .with_table(users(), vec![])
            .with_reported_count("users", 3);
        let mut dest = memory_dest();
        let mut lines: Vec<String> = Vec::new();

        let stats = exporter(&[])
            .export_into(&mut source, &mut dest, &mut lines)
            .unwrap();

        assert_eq!(source.streamed_tables(), ["users".to_string()]);
        assert_eq!(stats.transactions, 0);
        assert_eq!(dest.committed_transactions(), 0);
        assert_eq!(stats.tables[0].skipped, Some(SkipReason::NoRows));
    }

    #[test]
    fn test_transactions_counted_per_run() {
        let mut dest = memory_dest();
        let mut lines: Vec<String> = Vec::new();
        let exporter = exporter(&[]);

        let mut source = MemorySource::new().with_table(users(), user_rows());
        let first = exporter
            .export_into(&mut source, &mut dest, &mut lines)
            .unwrap();

        let mut source = MemorySource::new()
            .with_table(users(), user_rows())
            .with_table(
                TableDefinition::new("tags", vec![ColumnDescriptor::new("id", "int")]),
                vec![],
            );
        let second = exporter
            .export_into(&mut source, &mut dest, &mut lines)
            .unwrap();

        assert_eq!(first.transactions, 1);
        assert_eq!(second.transactions, 1);
        assert_eq!(dest.committed_transactions(), 2);
        assert_eq!(dest.row_count("users").unwrap(), 2);
    }

    #[test]
    fn test_column_mismatch_aborts() {
        let mut source = MemorySource::new()
            .with_table(users(), user_rows())
            .with_projection(
                "users",
                vec!["id".to_string(), "name".to_string(), "is_admin".to_string()],
            );
        let mut dest = memory_dest();
        let mut lines: Vec<String> = Vec::new();

        let err = exporter(&[])
            .export_into(&mut source, &mut dest, &mut lines)
            .unwrap_err();

        let msg = format!("{:#}", err);
        assert!(msg.contains("Column mismatch for table users"), "{}", msg);
        assert!(msg.contains("admin"));
        assert!(!dest.in_transaction());
    }

    #[test]
    fn test_write_failure_rolls_back() {
        // second row violates the primary key
        let rows = vec![
            vec![1i64.into(), "Ada".into(), true.into()],
            vec![1i64.into(), "Dup".into(), false.into()],
        ];
        let mut source = MemorySource::new().with_table(users(), rows);
        let mut dest = memory_dest();
        let mut lines: Vec<String> = Vec::new();

        let result = exporter(&[]).export_into(&mut source, &mut dest, &mut lines);

        assert!(result.is_err());
        assert!(!dest.in_transaction());
        assert_eq!(dest.row_count("users").unwrap(), 0);
    }

    #[test]
    fn test_verify_columns_ignores_order() {
        let table = users();
        let cols = vec!["name".to_string(), "admin".to_string(), "id".to_string()];
        assert!(verify_columns(&table, &cols).is_ok());
        assert!(verify_columns(&table, &cols[..2]).is_err());
    }

    #[test]
    fn test_table_allow_list() {
        let mut source = MemorySource::new()
            .with_table(users(), user_rows())
            .with_table(
                TableDefinition::new("posts", vec![ColumnDescriptor::new("id", "int")]),
                vec![vec![Value::Integer(1)]],
            );
        let mut dest = memory_dest();
        let mut lines: Vec<String> = Vec::new();

        let exporter = Exporter::new(ExportConfig {
            tables: vec!["posts".to_string(), "ghosts".to_string()],
            ..Default::default()
        })
        .unwrap();
        let stats = exporter
            .export_into(&mut source, &mut dest, &mut lines)
            .unwrap();

        assert_eq!(stats.tables_found, 1);
        assert_eq!(stats.tables[0].table, "posts");
        assert!(lines.iter().any(|l| l.contains("Skipping ghosts")));
        assert!(dest.row_count("users").is_err());
    }

    #[test]
    fn test_plan() {
        let mut source = MemorySource::new()
            .with_table(users(), user_rows())
            .with_table(
                TableDefinition::new("audits", vec![ColumnDescriptor::new("id", "int")]),
                vec![vec![Value::Integer(1)]],
            );
        let mut lines: Vec<String> = Vec::new();

        let plans = exporter(&["audits"]).plan(&mut source, &mut lines).unwrap();

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].table, "audits");
        assert!(!plans[0].copy_data);
        assert_eq!(plans[0].ignored_by.as_deref(), Some("audits"));
        assert_eq!(plans[1].table, "users");
        assert!(plans[1].copy_data);
        assert_eq!(plans[1].rows, 2);
        assert!(source.streamed_tables().is_empty());
    }
}
