//! Minimal database access layer.
//!
//! - [`ConnectionPool`]: a bounded, fail-fast pool of driver connections
//! - [`TransactionContext`] / [`Session`]: per-caller transactions pinned to one connection
//! - [`Sql`]: a fluent builder that accumulates SQL text and positional parameters
//! - [`results`] and [`typed`]: shaped results, rows, and projection into caller types
//!
//! ```rust,no_run
//! use simple_db::prelude::*;
//!
//! struct Article {
//!     id: i64,
//!     title: String,
//! }
//! impl_from_row!(Article { id, title });
//!
//! let db = SimpleDb::new(DbConfig::new("blog.db"))?;
//! let articles: Vec<Article> = db
//!     .gen_sql()
//!     .append("SELECT id, title FROM article")
//!     .append_in("WHERE id IN (?)", [1, 2, 3])
//!     .select_rows_as()?;
//! # let _ = articles;
//! # Ok::<(), SimpleDbError>(())
//! ```

pub mod config;
pub mod db;
pub mod driver;
pub mod error;
pub mod executor;
pub mod pool;
pub mod prelude;
pub mod query_builder;
pub mod results;
pub mod transaction;
pub mod translation;
pub mod typed;
pub mod types;

mod helpers;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{DbConfig, DbConfigBuilder};
pub use db::{Queryable, Session, SimpleDb};
pub use driver::{ColumnMeta, ColumnType, Connection, Connector, Cursor, DriverError, Statement};
pub use error::{Result, SimpleDbError};
pub use executor::{QueryTarget, StatementKind};
pub use pool::{ConnectionId, ConnectionPool, PoolStatus, PooledConnection};
pub use query_builder::Sql;
pub use results::{QueryResult, Row, Shape};
pub use transaction::TransactionContext;
pub use typed::{FromRow, FromSqlValue};
pub use types::SqlValue;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnector;
