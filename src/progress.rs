//! Progress reporting.
//!
//! The exporter writes human-readable lines to a [`Progress`] sink and can
//! show a per-table row bar through indicatif.

use indicatif::{ProgressBar, ProgressStyle};

/// Receiver for progress and skip/error lines
pub trait Progress {
    fn line(&mut self, line: &str);
}

/// Writes every line to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrProgress;

impl Progress for StderrProgress {
    fn line(&mut self, line: &str) {
        eprintln!("{}", line);
    }
}

/// Collects lines, mostly useful in tests
impl Progress for Vec<String> {
    fn line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Row progress bar for copying a table of `total` rows
pub fn row_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("  {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%)")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_collects_lines() {
        let mut lines: Vec<String> = Vec::new();
        lines.line("[1/2] Exporting users");
        lines.line("[2/2] Exporting posts");
        assert_eq!(lines, vec!["[1/2] Exporting users", "[2/2] Exporting posts"]);
    }

    #[test]
    fn test_row_bar_length() {
        let pb = row_bar(42);
        assert_eq!(pb.length(), Some(42));
        pb.finish_and_clear();
    }
}
