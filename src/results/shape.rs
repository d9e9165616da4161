use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use super::row::Row;
use crate::error::{Result, SimpleDbError};

/// The kind of result a statement is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Affected-row count of a non-query statement
    AffectedRows,
    ScalarString,
    ScalarLong,
    ScalarBoolean,
    ScalarDatetime,
    SingleRow,
    RowSequence,
}

impl Shape {
    pub const ALL: [Shape; 7] = [
        Shape::AffectedRows,
        Shape::ScalarString,
        Shape::ScalarLong,
        Shape::ScalarBoolean,
        Shape::ScalarDatetime,
        Shape::SingleRow,
        Shape::RowSequence,
    ];

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Shape::AffectedRows => "affected-rows",
            Shape::ScalarString => "scalar-string",
            Shape::ScalarLong => "scalar-long",
            Shape::ScalarBoolean => "scalar-boolean",
            Shape::ScalarDatetime => "scalar-datetime",
            Shape::SingleRow => "single-row",
            Shape::RowSequence => "row-sequence",
        }
    }

    /// Whether an empty result is an error for this shape.
    #[must_use]
    pub fn requires_row(self) -> bool {
        !matches!(self, Shape::RowSequence | Shape::AffectedRows)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Shape {
    type Err = SimpleDbError;

    fn from_str(s: &str) -> Result<Self> {
        Shape::ALL
            .into_iter()
            .find(|shape| shape.tag() == s)
            .ok_or_else(|| SimpleDbError::UnsupportedShape(s.to_string()))
    }
}

/// A mapped statement result; the variant follows the requested [`Shape`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Affected(usize),
    Text(String),
    Long(i64),
    Bool(bool),
    Datetime(NaiveDateTime),
    Row(Row),
    Rows(Vec<Row>),
}

impl QueryResult {
    fn kind(&self) -> &'static str {
        match self {
            QueryResult::Affected(_) => "affected-row count",
            QueryResult::Text(_) => "string",
            QueryResult::Long(_) => "long",
            QueryResult::Bool(_) => "boolean",
            QueryResult::Datetime(_) => "datetime",
            QueryResult::Row(_) => "row",
            QueryResult::Rows(_) => "row sequence",
        }
    }

    fn mismatch(&self, wanted: &str) -> SimpleDbError {
        SimpleDbError::UnsupportedShape(format!("expected {wanted}, got {}", self.kind()))
    }

    /// # Errors
    /// Returns `SimpleDbError::UnsupportedShape` for any other variant.
    pub fn into_affected(self) -> Result<usize> {
        match self {
            QueryResult::Affected(n) => Ok(n),
            other => Err(other.mismatch("affected-row count")),
        }
    }

    /// # Errors
    /// Returns `SimpleDbError::UnsupportedShape` for any other variant.
    pub fn into_text(self) -> Result<String> {
        match self {
            QueryResult::Text(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    /// # Errors
    /// Returns `SimpleDbError::UnsupportedShape` for any other variant.
    pub fn into_long(self) -> Result<i64> {
        match self {
            QueryResult::Long(n) => Ok(n),
            other => Err(other.mismatch("long")),
        }
    }

    /// # Errors
    /// Returns `SimpleDbError::UnsupportedShape` for any other variant.
    pub fn into_bool(self) -> Result<bool> {
        match self {
            QueryResult::Bool(b) => Ok(b),
            other => Err(other.mismatch("boolean")),
        }
    }

    /// # Errors
    /// Returns `SimpleDbError::UnsupportedShape` for any other variant.
    pub fn into_datetime(self) -> Result<NaiveDateTime> {
        match self {
            QueryResult::Datetime(dt) => Ok(dt),
            other => Err(other.mismatch("datetime")),
        }
    }

    /// # Errors
    /// Returns `SimpleDbError::UnsupportedShape` for any other variant.
    pub fn into_row(self) -> Result<Row> {
        match self {
            QueryResult::Row(row) => Ok(row),
            other => Err(other.mismatch("row")),
        }
    }

    /// # Errors
    /// Returns `SimpleDbError::UnsupportedShape` for any other variant.
    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self {
            QueryResult::Rows(rows) => Ok(rows),
            other => Err(other.mismatch("row sequence")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_back() {
        for shape in Shape::ALL {
            assert_eq!(shape.tag().parse::<Shape>().unwrap(), shape);
        }
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let err = "scalar-uuid".parse::<Shape>().unwrap_err();
        assert!(matches!(err, SimpleDbError::UnsupportedShape(ref s) if s == "scalar-uuid"));
    }

    #[test]
    fn accessor_mismatch_is_reported() {
        let err = QueryResult::Long(3).into_rows().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported result shape: expected row sequence, got long"
        );
    }
}
