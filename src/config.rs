//! Connection and export configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! environment variables and command-line flags (both handled by clap).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_OUTPUT: &str = "database/database.sqlite";

/// Connection settings, every field optional so layers can be merged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SourceSection {
    /// Overlay `over` on top of `self`; fields set in `over` win
    pub fn merge(self, over: SourceSection) -> SourceSection {
        SourceSection {
            host: over.host.or(self.host),
            port: over.port.or(self.port),
            database: over.database.or(self.database),
            username: over.username.or(self.username),
            password: over.password.or(self.password),
        }
    }

    /// Apply defaults and check required fields
    pub fn resolve(self) -> anyhow::Result<SourceConfig> {
        let database = match self.database {
            Some(db) if !db.trim().is_empty() => db,
            _ => anyhow::bail!(
                "No source database given. Use --database, DB_DATABASE or `source.database` in the config file"
            ),
        };

        Ok(SourceConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            database,
            username: self.username.unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: self.password.filter(|p| !p.is_empty()),
        })
    }
}

/// Fully resolved MySQL connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
}

impl SourceConfig {
    /// `user@host:port/database`, never includes the password
    pub fn display_target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

/// YAML configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Source connection
    pub source: SourceSection,
    /// Destination SQLite file
    pub output: Option<PathBuf>,
    /// Ignore patterns: tables matching these get schema only
    pub ignore: Vec<String>,
    /// Only export these tables
    pub tables: Vec<String>,
}

impl FileConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let config: FileConfig = serde_yaml_ng::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Load when a path is given, otherwise use an empty config
    pub fn load_optional(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// Create the destination's parent directory when it is missing
pub fn prepare_output_path(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Cannot create output directory {}: {}", parent.display(), e)
            })?;
        }
    }
    if path.is_dir() {
        anyhow::bail!("Output path {} is a directory", path.display());
    }
    Ok(())
}
