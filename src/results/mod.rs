//! Mapping driver cursors into shaped results.

mod mapper;
mod row;
mod shape;

pub use mapper::{convert_column, map_cursor};
pub use row::Row;
pub use shape::{QueryResult, Shape};
