//! The connection capability consumed by the pool and executor.
//!
//! Drivers implement these traits; the rest of the crate never touches a
//! driver type directly. Column indexes are zero-based on the Rust side while
//! parameter indexes are one-based, matching the wire protocols.

use thiserror::Error;

use crate::types::SqlValue;

/// Failure reported by a driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("cannot bind parameter {index}: {message}")]
    Binding { index: usize, message: String },

    #[error("connection is closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

/// Column type classes the result mapper knows how to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Boolean,
    Timestamp,
    Text,
    Float,
    Blob,
    /// A declared type the driver reported but no class covers.
    Other(String),
    /// The driver has no type information (e.g. computed expressions).
    Unknown,
}

/// Label and type class of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub label: String,
    pub column_type: ColumnType,
}

impl ColumnMeta {
    #[must_use]
    pub fn new(label: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            label: label.into(),
            column_type,
        }
    }
}

/// Opens new connections. The pool is the only caller.
pub trait Connector: Send + Sync {
    /// Open one live session.
    ///
    /// # Errors
    /// Returns `DriverError` if the session cannot be established.
    fn connect(&self) -> Result<Box<dyn Connection>, DriverError>;
}

/// One live database session.
pub trait Connection: Send {
    /// Prepare `sql` for binding and execution.
    ///
    /// # Errors
    /// Returns `DriverError` if the statement is rejected or the connection is closed.
    fn prepare<'c>(&'c mut self, sql: &str) -> Result<Box<dyn Statement + 'c>, DriverError>;

    /// Toggle auto-commit. Disabling it opens a transaction that lasts until
    /// `commit`/`rollback`; re-enabling it commits anything pending.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver rejects the change.
    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError>;

    fn auto_commit(&self) -> bool;

    /// # Errors
    /// Returns `DriverError` if the commit fails or auto-commit is enabled.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the rollback fails or auto-commit is enabled.
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// Close the session. Closing twice is a no-op.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver fails while closing.
    fn close(&mut self) -> Result<(), DriverError>;

    fn is_closed(&self) -> bool;
}

/// A prepared statement awaiting parameters.
pub trait Statement {
    /// Number of placeholders the statement expects.
    fn parameter_count(&self) -> usize;

    /// Bind `value` at the one-based `index`.
    ///
    /// # Errors
    /// Returns `DriverError::Binding` (or a driver error) if the value cannot be bound.
    fn bind(&mut self, index: usize, value: &SqlValue) -> Result<(), DriverError>;

    /// Run as an update and report affected rows.
    ///
    /// # Errors
    /// Returns `DriverError` if execution fails.
    fn execute_update(&mut self) -> Result<usize, DriverError>;

    /// Run as a query and hand back a cursor positioned before the first row.
    ///
    /// # Errors
    /// Returns `DriverError` if execution fails.
    fn execute_query<'s>(&'s mut self) -> Result<Box<dyn Cursor + 's>, DriverError>;
}

/// Forward-only cursor over a query result.
pub trait Cursor {
    /// Move to the next row; `false` once the result is exhausted.
    ///
    /// # Errors
    /// Returns `DriverError` if fetching the row fails.
    fn advance(&mut self) -> Result<bool, DriverError>;

    fn columns(&self) -> &[ColumnMeta];

    /// Raw value of the current row at the zero-based `index`.
    ///
    /// # Errors
    /// Returns `DriverError` if there is no current row or the index is out of range.
    fn value(&self, index: usize) -> Result<SqlValue, DriverError>;
}
