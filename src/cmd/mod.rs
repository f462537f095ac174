mod export;
mod tables;

use crate::config::{FileConfig, SourceConfig, SourceSection, DEFAULT_OUTPUT};
use crate::export::ExportConfig;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mysql2sqlite")]
#[command(version)]
#[command(about = "Export a MySQL/MariaDB database into a single SQLite file", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export schema and data into a SQLite file
    #[command(after_help = "Examples:
  mysql2sqlite export -D shop -o shop.sqlite
  mysql2sqlite export -D shop --ignore '%telescope%' --ignore audits
  mysql2sqlite export --config export.yaml --progress
  DB_DATABASE=shop DB_PASSWORD=secret mysql2sqlite export --dry-run")]
    Export(ExportArgs),

    /// List source tables and whether their rows would be copied
    Tables(SourceArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Source connection and table selection, shared by all commands
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// MySQL host
    #[arg(long, env = "DB_HOST")]
    pub host: Option<String>,

    /// MySQL port
    #[arg(long, env = "DB_PORT")]
    pub port: Option<u16>,

    /// Database (schema) to export
    #[arg(short = 'D', long, env = "DB_DATABASE")]
    pub database: Option<String>,

    /// MySQL user
    #[arg(short, long, env = "DB_USERNAME")]
    pub user: Option<String>,

    /// MySQL password
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// YAML config file with `source`, `output`, `ignore` and `tables` keys
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Copy schema only for tables matching this pattern (`%` = wildcard, repeatable)
    #[arg(short, long, value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Only export these tables (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tables: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output SQLite file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show a row progress bar for each table
    #[arg(short, long)]
    pub progress: bool,

    /// Preview which tables would be exported without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Connection settings and export configuration after merging all layers
pub struct ResolvedSettings {
    pub source: SourceConfig,
    pub export: ExportConfig,
}

impl SourceArgs {
    fn overrides(&self) -> SourceSection {
        SourceSection {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            username: self.user.clone(),
            password: self.password.clone(),
        }
    }

    /// Merge the config file (if any) with flags and environment
    pub fn resolve(&self, output: Option<PathBuf>, progress: bool) -> anyhow::Result<ResolvedSettings> {
        let file = FileConfig::load_optional(self.config.as_deref())?;
        resolve_settings(file, self, output, progress)
    }
}

fn resolve_settings(
    file: FileConfig,
    args: &SourceArgs,
    output: Option<PathBuf>,
    progress: bool,
) -> anyhow::Result<ResolvedSettings> {
    let source = file.source.merge(args.overrides()).resolve()?;

    let mut ignore = file.ignore;
    ignore.extend(args.ignore.iter().cloned());

    let tables = if args.tables.is_empty() {
        file.tables
    } else {
        args.tables.clone()
    };

    let output = output
        .or(file.output)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    Ok(ResolvedSettings {
        source,
        export: ExportConfig {
            output,
            ignore,
            tables,
            progress,
        },
    })
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Export(args) => export::run(args),
        Commands::Tables(args) => tables::run(args),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "mysql2sqlite",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
