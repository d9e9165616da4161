//! The public entry point: a configured pool plus per-caller sessions.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::config::DbConfig;
use crate::driver::Connector;
use crate::error::Result;
use crate::executor::{QueryTarget, execute};
use crate::pool::{ConnectionPool, PoolStatus};
use crate::query_builder::{self, Sql};
use crate::results::{QueryResult, Row, Shape};
use crate::transaction::TransactionContext;
use crate::typed::FromRow;
use crate::types::SqlValue;

/// Statement surface shared by [`SimpleDb`] and [`Session`].
///
/// Implementors only say where statements run; every operation is provided.
pub trait Queryable {
    fn target(&self) -> QueryTarget<'_>;

    /// Start a fluent builder bound to this target.
    fn gen_sql(&self) -> Sql<'_> {
        Sql::new(self.target())
    }

    /// Execute a non-query statement and return the affected-row count.
    ///
    /// # Errors
    /// Returns pool, binding, or execution errors; a `SELECT` fails with
    /// `SimpleDbError::UnsupportedShape`.
    fn run(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        execute(self.target(), sql, Shape::AffectedRows, params)?.into_affected()
    }

    /// Execute with an explicit result shape.
    ///
    /// # Errors
    /// Returns executor and mapping errors.
    fn query(&self, sql: &str, shape: Shape, params: &[SqlValue]) -> Result<QueryResult> {
        execute(self.target(), sql, shape, params)
    }

    /// # Errors
    /// Returns executor and mapping errors.
    fn select_rows(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        query_builder::rows(self.target(), sql, params)
    }

    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` for an empty result.
    fn select_row(&self, sql: &str, params: &[SqlValue]) -> Result<Row> {
        self.query(sql, Shape::SingleRow, params)?.into_row()
    }

    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` or `SimpleDbError::ConversionError`.
    fn select_long(&self, sql: &str, params: &[SqlValue]) -> Result<i64> {
        self.query(sql, Shape::ScalarLong, params)?.into_long()
    }

    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` or `SimpleDbError::ConversionError`.
    fn select_string(&self, sql: &str, params: &[SqlValue]) -> Result<String> {
        self.query(sql, Shape::ScalarString, params)?.into_text()
    }

    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` or `SimpleDbError::ConversionError`.
    fn select_boolean(&self, sql: &str, params: &[SqlValue]) -> Result<bool> {
        self.query(sql, Shape::ScalarBoolean, params)?.into_bool()
    }

    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` or `SimpleDbError::ConversionError`.
    fn select_datetime(&self, sql: &str, params: &[SqlValue]) -> Result<NaiveDateTime> {
        self.query(sql, Shape::ScalarDatetime, params)?.into_datetime()
    }

    /// # Errors
    /// Returns `SimpleDbError::ConversionError` if any first-column value is not an integer.
    fn select_longs(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<i64>> {
        query_builder::longs(self.target(), sql, params)
    }

    /// # Errors
    /// Returns `SimpleDbError::ProjectionError` if a row cannot populate `T`.
    fn select_rows_as<T: FromRow>(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<T>> {
        query_builder::rows_as(self.target(), sql, params)
    }

    /// # Errors
    /// Returns `SimpleDbError::NoRowsFound` or `SimpleDbError::ProjectionError`.
    fn select_row_as<T: FromRow>(&self, sql: &str, params: &[SqlValue]) -> Result<T> {
        query_builder::row_as(self.target(), sql, params)
    }
}

/// A configured connection pool.
///
/// Statements issued directly on `SimpleDb` lease a connection each. Use a
/// [`Session`] to group statements into a transaction.
///
/// ```rust,no_run
/// use simple_db::prelude::*;
///
/// let db = DbConfig::builder("blog.db").max_pool_size(4).build()?;
/// db.run("UPDATE article SET isBlind = ? WHERE id = ?", &params![true, 7])?;
///
/// let mut session = db.session();
/// session.start_transaction()?;
/// session.run("DELETE FROM article WHERE id = ?", &params![7])?;
/// session.commit()?;
/// # Ok::<(), SimpleDbError>(())
/// ```
#[derive(Debug)]
pub struct SimpleDb {
    config: DbConfig,
    pool: ConnectionPool,
}

impl SimpleDb {
    /// Open a pool over the `SQLite` file named by `config.database`.
    ///
    /// # Errors
    /// Returns `SimpleDbError::ConfigError` if the configuration is invalid.
    #[cfg(feature = "sqlite")]
    pub fn new(config: DbConfig) -> Result<Self> {
        let connector = crate::sqlite::SqliteConnector::from_config(&config);
        Self::with_connector(config, connector)
    }

    /// Open a pool over any driver.
    ///
    /// # Errors
    /// Returns `SimpleDbError::ConfigError` if the configuration is invalid.
    pub fn with_connector(config: DbConfig, connector: impl Connector + 'static) -> Result<Self> {
        config.validate()?;
        let pool = ConnectionPool::new(connector, config.max_pool_size)?;
        debug!(
            database = %config.connection_url(),
            max_pool_size = config.max_pool_size,
            "database handle created"
        );
        Ok(Self { config, pool })
    }

    /// A new caller context with its own transaction state.
    #[must_use]
    pub fn session(&self) -> Session<'_> {
        Session {
            db: self,
            tx: TransactionContext::new(),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    #[must_use]
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Close every pooled connection.
    ///
    /// # Errors
    /// Returns the first close failure; all connections are attempted.
    pub fn close(&self) -> Result<()> {
        self.pool.close_all()
    }
}

impl Queryable for SimpleDb {
    fn target(&self) -> QueryTarget<'_> {
        QueryTarget::pool(&self.pool)
    }
}

/// One caller's view of a [`SimpleDb`], carrying its transaction state.
///
/// While a transaction is active every statement issued through the session
/// runs on the same pinned connection. Dropping a session mid-transaction
/// rolls it back.
#[derive(Debug)]
pub struct Session<'db> {
    db: &'db SimpleDb,
    tx: TransactionContext,
}

impl Session<'_> {
    /// # Errors
    /// Returns `SimpleDbError::AlreadyInTransaction` if a transaction is active,
    /// or pool and driver errors while pinning a connection.
    pub fn start_transaction(&mut self) -> Result<()> {
        self.tx.begin(&self.db.pool)
    }

    /// # Errors
    /// Returns `SimpleDbError::NoActiveTransaction` or `SimpleDbError::TransactionFailure`.
    pub fn commit(&mut self) -> Result<()> {
        self.tx.commit()
    }

    /// # Errors
    /// Returns `SimpleDbError::NoActiveTransaction` or `SimpleDbError::TransactionFailure`.
    pub fn rollback(&mut self) -> Result<()> {
        self.tx.rollback()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.tx.is_active()
    }
}

impl Queryable for Session<'_> {
    fn target(&self) -> QueryTarget<'_> {
        QueryTarget::with_transaction(&self.db.pool, &self.tx)
    }
}
