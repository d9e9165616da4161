use thiserror::Error;

use crate::driver::DriverError;
use crate::pool::ConnectionId;

/// Errors surfaced by the pool, transaction context, executor, and mappers.
///
/// Nothing is retried or swallowed: every variant reaches the caller.
#[derive(Debug, Error)]
pub enum SimpleDbError {
    #[error("failed to open database connection: {0}")]
    ConnectionCreationFailure(#[source] DriverError),

    #[error("connection pool exhausted: all {max_pool_size} connections are leased")]
    PoolExhausted { max_pool_size: usize },

    #[error("connection {connection_id} is not leased from this pool")]
    InvalidRelease { connection_id: ConnectionId },

    #[error("failed to close connection {connection_id}: {source}")]
    CloseFailure {
        connection_id: ConnectionId,
        #[source]
        source: DriverError,
    },

    #[error("a transaction is already active in this context")]
    AlreadyInTransaction,

    #[error("no transaction is active in this context")]
    NoActiveTransaction,

    #[error("parameter binding error: {0}")]
    ParamBindingError(String),

    #[error("statement execution failed: {source} (sql: {sql})")]
    StatementExecutionError {
        sql: String,
        #[source]
        source: DriverError,
    },

    #[error("transaction {action} failed: {source}")]
    TransactionFailure {
        action: &'static str,
        #[source]
        source: DriverError,
    },

    #[error("query returned no rows")]
    NoRowsFound,

    #[error("cannot populate `{field}`: {reason}")]
    ProjectionError { field: String, reason: String },

    #[error("unsupported result shape: {0}")]
    UnsupportedShape(String),

    #[error("value conversion error: {0}")]
    ConversionError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl SimpleDbError {
    pub(crate) fn execution(sql: &str, source: DriverError) -> Self {
        SimpleDbError::StatementExecutionError {
            sql: sql.trim().to_string(),
            source,
        }
    }

    pub(crate) fn projection(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SimpleDbError::ProjectionError {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = SimpleDbError> = std::result::Result<T, E>;
