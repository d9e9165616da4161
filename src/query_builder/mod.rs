//! Fluent SQL assembly feeding the statement executor.

mod dml;
mod select;

use std::fmt;

use crate::executor::QueryTarget;
use crate::translation::expand_in_placeholder;
use crate::types::SqlValue;

pub(crate) use select::{longs, row_as, rows, rows_as};

/// Accumulates SQL text and positional parameters for one statement.
///
/// Builder methods consume and return the builder; terminal methods
/// (`insert`, `select_rows`, ...) only read it, so the assembled text and
/// parameters can still be inspected afterwards.
///
/// ```rust
/// use simple_db::prelude::*;
///
/// let pool = ConnectionPool::new(SqliteConnector::new(":memory:"), 1)?;
/// let sql = Sql::new(QueryTarget::pool(&pool))
///     .append("SELECT id FROM article")
///     .append_in("WHERE id IN (?)", [1, 2, 3])
///     .append_with("AND isBlind = ?", [false]);
/// assert_eq!(sql.sql(), "SELECT id FROM article WHERE id IN (?, ?, ?) AND isBlind = ? ");
/// assert_eq!(sql.params().len(), 4);
/// # Ok::<(), SimpleDbError>(())
/// ```
pub struct Sql<'a> {
    target: QueryTarget<'a>,
    query: String,
    params: Vec<SqlValue>,
}

impl<'a> Sql<'a> {
    #[must_use]
    pub fn new(target: QueryTarget<'a>) -> Self {
        Self {
            target,
            query: String::new(),
            params: Vec::new(),
        }
    }

    /// Append `fragment` followed by a separating space.
    #[must_use]
    pub fn append(mut self, fragment: &str) -> Self {
        self.query.push_str(fragment);
        self.query.push(' ');
        self
    }

    /// Append `fragment` and extend the parameters with `values` in order.
    #[must_use]
    pub fn append_with<I>(mut self, fragment: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SqlValue>,
    {
        self.params.extend(values.into_iter().map(Into::into));
        self.append(fragment)
    }

    /// Like [`append_with`](Self::append_with), but first widens the first `?`
    /// in `fragment` to one placeholder per value.
    #[must_use]
    pub fn append_in<I>(self, fragment: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SqlValue>,
    {
        let values: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        let expanded = expand_in_placeholder(fragment, values.len());
        self.append_with(&expanded, values)
    }

    /// The assembled SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

impl fmt::Debug for Sql<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sql")
            .field("query", &self.query)
            .field("params", &self.params)
            .field("in_transaction", &self.target.in_transaction())
            .finish()
    }
}
