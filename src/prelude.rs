//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and macros
//! to make it easier to get started with the library.

pub use crate::config::{DbConfig, DbConfigBuilder};
pub use crate::db::{Queryable, Session, SimpleDb};
pub use crate::error::SimpleDbError;
pub use crate::executor::QueryTarget;
pub use crate::pool::{ConnectionPool, PoolStatus};
pub use crate::query_builder::Sql;
pub use crate::results::{QueryResult, Row, Shape};
pub use crate::transaction::TransactionContext;
pub use crate::typed::{FromRow, FromSqlValue};
pub use crate::types::SqlValue;
pub use crate::{impl_from_row, params};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnector;
