use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;

use super::row::{Row, column_index};
use super::shape::{QueryResult, Shape};
use crate::driver::{ColumnType, Cursor, DriverError};
use crate::error::{Result, SimpleDbError};
use crate::types::SqlValue;

/// Convert a raw driver value according to its column class.
///
/// Integer, timestamp, and boolean columns are normalized; every other class
/// passes through untouched. SQL NULL stays `SqlValue::Null`.
///
/// # Errors
/// Returns `SimpleDbError::ConversionError` if a value does not fit its column class.
pub fn convert_column(value: SqlValue, column_type: &ColumnType) -> Result<SqlValue> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    let converted = match column_type {
        ColumnType::Integer => value.as_int().map(SqlValue::Int),
        ColumnType::Boolean => value.as_bool().map(SqlValue::Bool),
        ColumnType::Timestamp => match &value {
            // Epoch seconds
            SqlValue::Int(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|dt| SqlValue::Timestamp(dt.naive_utc())),
            other => other.as_timestamp().map(SqlValue::Timestamp),
        },
        _ => return Ok(value),
    };
    converted.ok_or_else(|| {
        SimpleDbError::ConversionError(format!(
            "cannot read {} value as {column_type:?}",
            value.type_name()
        ))
    })
}

/// Drain `cursor` into the result `shape` asks for.
///
/// The cursor is advanced once for scalar and single-row shapes and until
/// exhaustion for `RowSequence`. `sql` is only used to label driver failures.
///
/// # Errors
/// - `UnsupportedShape` for `AffectedRows`, which a query cannot produce
/// - `NoRowsFound` when a scalar or single-row shape meets an empty result
/// - `ConversionError` when a value does not fit its column class or the scalar
/// - `StatementExecutionError` when the driver fails while fetching
pub fn map_cursor<C: Cursor + ?Sized>(
    cursor: &mut C,
    shape: Shape,
    sql: &str,
) -> Result<QueryResult> {
    if shape == Shape::AffectedRows {
        return Err(not_a_query(shape));
    }

    if !advance(cursor, sql)? {
        return if shape.requires_row() {
            Err(SimpleDbError::NoRowsFound)
        } else {
            Ok(QueryResult::Rows(Vec::new()))
        };
    }

    match shape {
        Shape::ScalarString | Shape::ScalarLong | Shape::ScalarBoolean | Shape::ScalarDatetime => {
            let column_type = cursor
                .columns()
                .first()
                .map(|c| c.column_type.clone())
                .ok_or_else(|| SimpleDbError::ConversionError("result has no columns".into()))?;
            let raw = cursor.value(0).map_err(|e| SimpleDbError::execution(sql, e))?;
            scalar(convert_column(raw, &column_type)?, shape)
        }
        Shape::SingleRow => {
            let layout = Layout::of(cursor);
            Ok(QueryResult::Row(layout.read_row(cursor, sql)?))
        }
        Shape::RowSequence => {
            let layout = Layout::of(cursor);
            let mut rows = vec![layout.read_row(cursor, sql)?];
            while advance(cursor, sql)? {
                rows.push(layout.read_row(cursor, sql)?);
            }
            Ok(QueryResult::Rows(rows))
        }
        Shape::AffectedRows => Err(not_a_query(shape)),
    }
}

fn not_a_query(shape: Shape) -> SimpleDbError {
    SimpleDbError::UnsupportedShape(format!("{shape} cannot be produced by a query"))
}

fn advance<C: Cursor + ?Sized>(cursor: &mut C, sql: &str) -> Result<bool> {
    cursor
        .advance()
        .map_err(|e| SimpleDbError::execution(sql, e))
}

fn scalar(value: SqlValue, shape: Shape) -> Result<QueryResult> {
    let wrong = |value: &SqlValue| {
        SimpleDbError::ConversionError(format!(
            "cannot read {} value as {shape}",
            value.type_name()
        ))
    };
    match shape {
        Shape::ScalarString => value.to_text().map(QueryResult::Text),
        Shape::ScalarLong => value.as_int().map(QueryResult::Long),
        Shape::ScalarBoolean => value.as_bool().map(QueryResult::Bool),
        Shape::ScalarDatetime => value.as_timestamp().map(QueryResult::Datetime),
        _ => None,
    }
    .ok_or_else(|| wrong(&value))
}

/// Column labels, label index, and classes shared by every row of one result.
struct Layout {
    labels: Arc<Vec<String>>,
    index: Arc<HashMap<String, usize>>,
    types: Vec<ColumnType>,
}

impl Layout {
    fn of<C: Cursor + ?Sized>(cursor: &C) -> Self {
        let labels: Vec<String> = cursor.columns().iter().map(|c| c.label.clone()).collect();
        let types = cursor
            .columns()
            .iter()
            .map(|c| c.column_type.clone())
            .collect();
        Self {
            index: Arc::new(column_index(&labels)),
            labels: Arc::new(labels),
            types,
        }
    }

    fn read_row<C: Cursor + ?Sized>(&self, cursor: &C, sql: &str) -> Result<Row> {
        let values = self
            .types
            .iter()
            .enumerate()
            .map(|(idx, column_type)| {
                let raw = cursor
                    .value(idx)
                    .map_err(|e: DriverError| SimpleDbError::execution(sql, e))?;
                convert_column(raw, column_type)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Row::with_index(
            Arc::clone(&self.labels),
            Arc::clone(&self.index),
            values,
        ))
    }
}
