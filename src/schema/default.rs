//! DEFAULT clause generation.

use super::StorageClass;
use once_cell::sync::Lazy;
use regex::Regex;

/// Defaults that SQLite evaluates at insert time and must stay unquoted
const TIME_KEYWORDS: &[&str] = &["CURRENT_TIMESTAMP", "CURRENT_DATE", "CURRENT_TIME"];

/// Build the DEFAULT clause for a column, or an empty string for none.
///
/// Numbers are emitted bare only for INTEGER columns; everything else that
/// is not a time keyword becomes a single-quoted literal.
pub fn build_default(raw_default: Option<&str>, class: StorageClass) -> String {
    let Some(value) = raw_default else {
        return String::new();
    };

    if class == StorageClass::Integer && is_numeric(value) {
        return format!("DEFAULT {}", value.trim());
    }

    if let Some(keyword) = time_keyword(value) {
        return format!("DEFAULT {}", keyword);
    }

    format!("DEFAULT '{}'", value.replace('\'', "''"))
}

fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(|n| n.is_finite())
}

/// MariaDB reports `current_timestamp()` and MySQL allows a fractional
/// precision like `CURRENT_TIMESTAMP(6)`; SQLite only takes the bare keyword.
fn time_keyword(value: &str) -> Option<&'static str> {
    static RE_PRECISION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*\d*\s*\)$").unwrap());

    let upper = value.trim().to_uppercase();
    let bare = RE_PRECISION.replace(&upper, "");
    TIME_KEYWORDS.iter().copied().find(|k| *k == bare)
}
