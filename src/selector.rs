//! Table selection: which tables to export and which get their rows copied.
//!
//! Ignore patterns use SQL `LIKE` syntax: `%` matches any run of characters,
//! everything else is literal. Matching is case-insensitive and anchored at
//! both ends, so `audits` matches only `audits`, never `user_audits`.

use regex::{Regex, RegexBuilder};

/// Ignore patterns compiled once for the whole run
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    patterns: Vec<CompiledPattern>,
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl IgnoreMatcher {
    /// Compile a list of `%`-wildcard patterns
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> anyhow::Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| compile_pattern(p.as_ref()))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// True when the table's rows must not be copied (schema is still created)
    pub fn should_skip_data(&self, table: &str) -> bool {
        self.matching_pattern(table).is_some()
    }

    /// The first pattern that matches the table, if any
    pub fn matching_pattern(&self, table: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(table))
            .map(|p| p.source.as_str())
    }
}

fn compile_pattern(pattern: &str) -> anyhow::Result<CompiledPattern> {
    let body = pattern
        .split('%')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    let regex = RegexBuilder::new(&format!("^{}$", body))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid ignore pattern '{}': {}", pattern, e))?;

    Ok(CompiledPattern {
        source: pattern.to_string(),
        regex,
    })
}

/// Restrict a table list to an explicit allow-list (case-insensitive).
///
/// Returns the kept tables in their original order plus the requested names
/// that do not exist in the source.
pub fn filter_tables(tables: Vec<String>, only: &[String]) -> (Vec<String>, Vec<String>) {
    if only.is_empty() {
        return (tables, Vec::new());
    }

    let missing = only
        .iter()
        .filter(|wanted| !tables.iter().any(|t| t.eq_ignore_ascii_case(wanted)))
        .cloned()
        .collect();

    let kept = tables
        .into_iter()
        .filter(|t| only.iter().any(|wanted| wanted.eq_ignore_ascii_case(t)))
        .collect();

    (kept, missing)
}
