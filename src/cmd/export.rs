//! Export command CLI handler.

use super::ExportArgs;
use crate::export::{Exporter, TablePlan};
use crate::progress::StderrProgress;
use crate::source::MySqlSource;

pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    let settings = args.source.resolve(args.output, args.progress)?;
    let exporter = Exporter::new(settings.export)?;

    eprintln!(
        "Exporting {} → {}",
        settings.source.display_target(),
        exporter.config().output.display()
    );

    let mut source = MySqlSource::connect(&settings.source)?;
    let mut progress = StderrProgress;

    if args.dry_run {
        let plans = exporter.plan(&mut source, &mut progress)?;
        print_plan(&plans);
        eprintln!();
        eprintln!("(Dry run - no output written)");
        return source.close();
    }

    let stats = exporter.run(&mut source, &mut progress)?;
    source.close()?;

    if stats.tables_found == 0 {
        return Ok(());
    }

    let skipped: Vec<_> = stats.skipped_schemas().collect();
    if !skipped.is_empty() {
        eprintln!();
        eprintln!("Skipped tables ({}):", skipped.len());
        for outcome in skipped {
            if let Some(ref reason) = outcome.skipped {
                eprintln!("  - {}: {}", outcome.table, reason);
            }
        }
    }

    eprintln!();
    eprintln!("{}", stats);
    Ok(())
}

pub(super) fn print_plan(plans: &[TablePlan]) {
    if plans.is_empty() {
        eprintln!("No tables found");
        return;
    }

    let width = plans.iter().map(|p| p.table.len()).max().unwrap_or(0);
    let mut copied_rows = 0u64;

    for plan in plans {
        let policy = if plan.copy_data {
            copied_rows += plan.rows;
            "schema+data".to_string()
        } else {
            match plan.ignored_by {
                Some(ref pattern) => format!("schema only ({})", pattern),
                None => "schema only".to_string(),
            }
        };
        println!(
            "{:<width$}  {:>10} rows  {}",
            plan.table,
            plan.rows,
            policy,
            width = width
        );
    }

    let with_data = plans.iter().filter(|p| p.copy_data).count();
    eprintln!();
    eprintln!(
        "{} tables, {} with data ({} rows), {} schema only",
        plans.len(),
        with_data,
        copied_rows,
        plans.len() - with_data
    );
}
