//! Per-table outcomes and run totals.

use std::fmt;
use std::path::PathBuf;

/// Why a table got no rows copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The source reported no columns, so no schema could be built
    NoColumns,
    /// Matched this ignore pattern; schema only
    Ignored(String),
    /// The table is empty
    NoRows,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoColumns => write!(f, "no columns found"),
            SkipReason::Ignored(pattern) => write!(f, "matches ignore pattern '{}'", pattern),
            SkipReason::NoRows => write!(f, "no rows"),
        }
    }
}

/// What happened to one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutcome {
    pub table: String,
    pub schema_created: bool,
    pub rows_copied: u64,
    pub skipped: Option<SkipReason>,
}

impl TableOutcome {
    pub fn copied(table: &str, rows: u64) -> Self {
        Self {
            table: table.to_string(),
            schema_created: true,
            rows_copied: rows,
            skipped: None,
        }
    }

    pub fn skipped(table: &str, schema_created: bool, reason: SkipReason) -> Self {
        Self {
            table: table.to_string(),
            schema_created,
            rows_copied: 0,
            skipped: Some(reason),
        }
    }
}

/// What an export would do with one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    pub table: String,
    pub copy_data: bool,
    /// Ignore pattern responsible for schema-only treatment
    pub ignored_by: Option<String>,
    pub rows: u64,
}

/// Totals for a finished run
#[derive(Debug, Clone, Default)]
pub struct ExportStats {
    /// Destination file
    pub output: PathBuf,
    /// Tables selected for export
    pub tables_found: usize,
    /// Tables whose CREATE TABLE succeeded
    pub schemas_created: usize,
    /// Rows written across all tables
    pub rows_copied: u64,
    /// Transactions committed on the destination during the run
    pub transactions: usize,
    /// Outcome of every processed table, in processing order
    pub tables: Vec<TableOutcome>,
    /// Run duration in seconds
    pub duration_secs: f64,
}

impl ExportStats {
    pub fn new(output: PathBuf) -> Self {
        Self {
            output,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: TableOutcome) {
        if outcome.schema_created {
            self.schemas_created += 1;
        }
        self.rows_copied += outcome.rows_copied;
        self.tables.push(outcome);
    }

    /// Tables that did not get a schema
    pub fn skipped_schemas(&self) -> impl Iterator<Item = &TableOutcome> {
        self.tables.iter().filter(|t| !t.schema_created)
    }
}

impl fmt::Display for ExportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exported {} tables, {} rows in {:.2}s → {}",
            self.schemas_created,
            self.rows_copied,
            self.duration_secs,
            self.output.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_totals() {
        let mut stats = ExportStats::new(PathBuf::from("out.sqlite"));
        stats.record(TableOutcome::copied("users", 3));
        stats.record(TableOutcome::skipped(
            "audits",
            true,
            SkipReason::Ignored("audits".into()),
        ));
        stats.record(TableOutcome::skipped("broken", false, SkipReason::NoColumns));

        assert_eq!(stats.schemas_created, 2);
        assert_eq!(stats.rows_copied, 3);
        assert_eq!(stats.skipped_schemas().count(), 1);
    }

    #[test]
    fn test_display() {
        let mut stats = ExportStats::new(PathBuf::from("out.sqlite"));
        stats.record(TableOutcome::copied("users", 3));
        stats.duration_secs = 1.5;
        assert_eq!(
            stats.to_string(),
            "Exported 1 tables, 3 rows in 1.50s → out.sqlite"
        );
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(
            SkipReason::Ignored("%telescope%".into()).to_string(),
            "matches ignore pattern '%telescope%'"
        );
        assert_eq!(SkipReason::NoColumns.to_string(), "no columns found");
    }
}
