use chrono::NaiveDateTime;

use crate::error::{Result, SimpleDbError};
use crate::executor::{QueryTarget, execute};
use crate::results::{QueryResult, Row, Shape};
use crate::typed::FromRow;
use crate::types::SqlValue;

use super::Sql;

impl Sql<'_> {
    /// Execute with an explicit result shape.
    ///
    /// # Errors
    /// Returns executor and mapping errors.
    pub fn query(&self, shape: Shape) -> Result<QueryResult> {
        execute(self.target, &self.query, shape, &self.params)
    }

    /// Every row; an empty result is an empty `Vec`.
    ///
    /// # Errors
    /// Returns executor and mapping errors.
    pub fn select_rows(&self) -> Result<Vec<Row>> {
        rows(self.target, &self.query, &self.params)
    }

    /// The first row.
    ///
    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` for an empty result.
    pub fn select_row(&self) -> Result<Row> {
        self.query(Shape::SingleRow)?.into_row()
    }

    /// Column 1 of the first row as an integer.
    ///
    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` for an empty result and
    /// `SimpleDbError::ConversionError` for NULL or non-integer values.
    pub fn select_long(&self) -> Result<i64> {
        self.query(Shape::ScalarLong)?.into_long()
    }

    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` for an empty result and
    /// `SimpleDbError::ConversionError` for NULL.
    pub fn select_string(&self) -> Result<String> {
        self.query(Shape::ScalarString)?.into_text()
    }

    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` for an empty result and
    /// `SimpleDbError::ConversionError` for NULL or non-boolean values.
    pub fn select_boolean(&self) -> Result<bool> {
        self.query(Shape::ScalarBoolean)?.into_bool()
    }

    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` for an empty result and
    /// `SimpleDbError::ConversionError` for NULL or unparseable values.
    pub fn select_datetime(&self) -> Result<NaiveDateTime> {
        self.query(Shape::ScalarDatetime)?.into_datetime()
    }

    /// Column 1 of every row as an integer.
    ///
    /// # Errors
    /// Returns `SimpleDbError::ConversionError` if any value is NULL or not an integer.
    pub fn select_longs(&self) -> Result<Vec<i64>> {
        longs(self.target, &self.query, &self.params)
    }

    /// Every row projected into `T`.
    ///
    /// # Errors
    /// Returns `SimpleDbError::ProjectionError` if a row cannot populate `T`.
    pub fn select_rows_as<T: FromRow>(&self) -> Result<Vec<T>> {
        rows_as(self.target, &self.query, &self.params)
    }

    /// The first row projected into `T`.
    ///
    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` for an empty result and
    /// `SimpleDbError::ProjectionError` if the row cannot populate `T`.
    pub fn select_row_as<T: FromRow>(&self) -> Result<T> {
        row_as(self.target, &self.query, &self.params)
    }
}

pub(crate) fn rows(target: QueryTarget<'_>, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
    execute(target, sql, Shape::RowSequence, params)?.into_rows()
}

pub(crate) fn longs(target: QueryTarget<'_>, sql: &str, params: &[SqlValue]) -> Result<Vec<i64>> {
    rows(target, sql, params)?
        .iter()
        .map(|row| {
            let value = row.get_by_index(0).unwrap_or(&SqlValue::Null);
            value.as_int().ok_or_else(|| {
                SimpleDbError::ConversionError(format!(
                    "cannot read {} value as scalar-long",
                    value.type_name()
                ))
            })
        })
        .collect()
}

pub(crate) fn rows_as<T: FromRow>(
    target: QueryTarget<'_>,
    sql: &str,
    params: &[SqlValue],
) -> Result<Vec<T>> {
    rows(target, sql, params)?.iter().map(T::from_row).collect()
}

pub(crate) fn row_as<T: FromRow>(
    target: QueryTarget<'_>,
    sql: &str,
    params: &[SqlValue],
) -> Result<T> {
    let row = execute(target, sql, Shape::SingleRow, params)?.into_row()?;
    T::from_row(&row)
}
