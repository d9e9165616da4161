use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;

use crate::error::{Result, SimpleDbError};
use crate::typed::FromSqlValue;
use crate::types::SqlValue;

/// One result record: column labels in cursor order plus the converted values.
///
/// Labels and the label index are shared by every row of the same result.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<SqlValue>,
    // Label -> position, built once per result
    index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Build a standalone row. Rows produced by a query share their label index.
    #[must_use]
    pub fn new(columns: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        let index = Arc::new(column_index(&columns));
        Self {
            columns,
            values,
            index,
        }
    }

    pub(crate) fn with_index(
        columns: Arc<Vec<String>>,
        index: Arc<HashMap<String, usize>>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            columns,
            values,
            index,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of `label`, matched case-sensitively.
    #[must_use]
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Value of the column labelled `label`, or `None` if no such column exists.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&SqlValue> {
        self.column_index(label).and_then(|idx| self.values.get(idx))
    }

    /// Value at the zero-based `index`.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// `(label, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Convert the column labelled `label` into `T`.
    ///
    /// # Errors
    /// Returns `SimpleDbError::ProjectionError` if the column is missing and `T`
    /// has no value for absence, or the value does not convert.
    pub fn try_get<T: FromSqlValue>(&self, label: &str) -> Result<T> {
        match self.get(label) {
            Some(value) => T::from_sql_value(value)
                .map_err(|reason| SimpleDbError::projection(label, reason)),
            None => T::from_missing()
                .ok_or_else(|| SimpleDbError::projection(label, "no column with this label")),
        }
    }

    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }

    /// The row as a JSON object keyed by column label.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (label, value) in self.iter() {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

pub(crate) fn column_index(columns: &[String]) -> HashMap<String, usize> {
    // First occurrence wins for duplicate labels
    let mut index = HashMap::with_capacity(columns.len());
    for (pos, label) in columns.iter().enumerate() {
        index.entry(label.clone()).or_insert(pos);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_row;

    #[test]
    fn lookups_are_case_sensitive() {
        let row = create_test_row(&["id", "Title"], vec![SqlValue::Int(1), "a".into()]);
        assert_eq!(row.get("Title"), Some(&SqlValue::Text("a".into())));
        assert!(row.get("title").is_none());
    }

    #[test]
    fn iteration_preserves_column_order() {
        let row = create_test_row(
            &["z", "a", "m"],
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)],
        );
        let labels: Vec<_> = row.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, ["z", "a", "m"]);
    }

    #[test]
    fn duplicate_labels_resolve_to_the_first_column() {
        let row = create_test_row(&["id", "id"], vec![SqlValue::Int(1), SqlValue::Int(2)]);
        assert_eq!(row.get("id"), Some(&SqlValue::Int(1)));
    }

    #[test]
    fn json_view_is_an_object() {
        let row = create_test_row(&["id", "note"], vec![SqlValue::Int(4), SqlValue::Null]);
        assert_eq!(row.to_json(), serde_json::json!({"id": 4, "note": null}));
    }

    #[test]
    fn try_get_reports_the_field() {
        let row = create_test_row(&["id"], vec!["abc".into()]);
        let err = row.try_get::<i64>("id").unwrap_err();
        assert!(matches!(err, SimpleDbError::ProjectionError { ref field, .. } if field == "id"));
        assert_eq!(row.try_get::<Option<i64>>("missing").unwrap(), None);
    }
}
