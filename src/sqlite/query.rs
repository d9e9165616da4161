use rusqlite::types::ValueRef;

use crate::driver::{ColumnType, DriverError};
use crate::types::SqlValue;

/// Extract a `SqlValue` from a `SQLite` row without any type-directed conversion.
///
/// # Errors
///
/// Returns `DriverError` if the column index is out of range.
pub fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<SqlValue, DriverError> {
    let value = match row.get_ref(idx)? {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Int(i),
        ValueRef::Real(f) => SqlValue::Float(f),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    };
    Ok(value)
}

/// Classify a declared column type the way `SQLite` assigns affinity, with the
/// boolean and date/time names split out.
#[must_use]
pub fn column_type_from_decl(decl: Option<&str>) -> ColumnType {
    let Some(decl) = decl else {
        return ColumnType::Unknown;
    };
    let upper = decl.trim().to_ascii_uppercase();
    if upper.starts_with("BOOL") || upper == "BIT" || upper.starts_with("BIT(") {
        ColumnType::Boolean
    } else if upper.contains("DATE") || upper.contains("TIME") {
        ColumnType::Timestamp
    } else if upper.contains("INT") {
        ColumnType::Integer
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        ColumnType::Text
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        ColumnType::Float
    } else if upper.contains("BLOB") {
        ColumnType::Blob
    } else if upper.is_empty() {
        ColumnType::Unknown
    } else {
        ColumnType::Other(decl.to_string())
    }
}
