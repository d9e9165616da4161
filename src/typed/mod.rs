//! Structured projection of rows into caller-defined types.

mod macros;
mod traits;

pub use traits::{FromRow, FromSqlValue};
