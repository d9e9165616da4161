//! Conversion traits behind structured row projection.

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::results::Row;
use crate::types::SqlValue;

/// A caller-defined type that can be populated from one [`Row`].
///
/// Usually implemented with [`impl_from_row!`](crate::impl_from_row), which
/// matches struct fields to column labels.
pub trait FromRow: Sized {
    /// # Errors
    /// Returns `SimpleDbError::ProjectionError` if a required field cannot be populated.
    fn from_row(row: &Row) -> Result<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

/// Conversion from a single column value into a field type.
pub trait FromSqlValue: Sized {
    /// # Errors
    /// Returns a human readable reason when `value` does not fit `Self`.
    fn from_sql_value(value: &SqlValue) -> Result<Self, String>;

    /// Value to use when the row has no column for the field. `None` makes the
    /// field required.
    fn from_missing() -> Option<Self> {
        None
    }
}

fn mismatch(value: &SqlValue, wanted: &str) -> String {
    format!("expected {wanted}, found {}", value.type_name())
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        value.as_int().ok_or_else(|| mismatch(value, "integer"))
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        let wide = i64::from_sql_value(value)?;
        i32::try_from(wide).map_err(|_| format!("{wide} does not fit in i32"))
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        value.as_float().ok_or_else(|| mismatch(value, "float"))
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        value.as_bool().ok_or_else(|| mismatch(value, "boolean"))
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        value.to_text().ok_or_else(|| mismatch(value, "text"))
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        value.as_timestamp().ok_or_else(|| mismatch(value, "timestamp"))
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        value
            .as_blob()
            .or_else(|| value.as_text().map(str::as_bytes))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch(value, "blob"))
    }
}

impl FromSqlValue for JsonValue {
    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::Json(json) => Ok(json.clone()),
            SqlValue::Text(s) => serde_json::from_str(s).map_err(|e| e.to_string()),
            SqlValue::Null => Err(mismatch(value, "json")),
            other => serde_json::to_value(other).map_err(|e| e.to_string()),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_sql_value(value).map(Some)
        }
    }

    fn from_missing() -> Option<Self> {
        Some(None)
    }
}
