use rusqlite::types::Value;

use crate::types::{SqlValue, format_timestamp};

/// Convert a single `SqlValue` to a rusqlite `Value`.
#[must_use]
pub fn sqlite_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Int(i) => Value::Integer(*i),
        SqlValue::Float(f) => Value::Real(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Timestamp(dt) => Value::Text(format_timestamp(dt)),
        SqlValue::Null => Value::Null,
        SqlValue::Json(jval) => Value::Text(jval.to_string()),
        SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn booleans_and_timestamps_become_sqlite_primitives() {
        assert_eq!(sqlite_value(&SqlValue::Bool(true)), Value::Integer(1));
        let dt = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(
            sqlite_value(&SqlValue::Timestamp(dt)),
            Value::Text("2024-05-06 07:08:09".into())
        );
        assert_eq!(
            sqlite_value(&SqlValue::Json(serde_json::json!({"a": 1}))),
            Value::Text("{\"a\":1}".into())
        );
    }
}
