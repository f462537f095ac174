//! Type mapping from MySQL column types to SQLite storage classes.

use super::StorageClass;

const NUMERIC_MARKERS: &[&str] = &["decimal", "numeric", "double", "float"];
const BLOB_MARKERS: &[&str] = &["blob", "binary"];
const TEMPORAL_MARKERS: &[&str] = &["datetime", "timestamp", "date", "time"];

/// Map a MySQL type string onto a SQLite storage class.
///
/// Matching is case-insensitive and by substring, first rule wins:
/// integers, then exact/approximate numerics, then binary types. Temporal
/// types are stored as TEXT, as is anything unrecognised.
pub fn map_type(raw_type: &str) -> StorageClass {
    let lower = raw_type.to_lowercase();

    if lower.contains("int") {
        return StorageClass::Integer;
    }
    if NUMERIC_MARKERS.iter().any(|m| lower.contains(m)) {
        return StorageClass::Numeric;
    }
    if BLOB_MARKERS.iter().any(|m| lower.contains(m)) {
        return StorageClass::Blob;
    }
    if TEMPORAL_MARKERS.iter().any(|m| lower.contains(m)) {
        return StorageClass::Text;
    }

    StorageClass::Text
}
