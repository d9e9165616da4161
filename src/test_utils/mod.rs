//! Test doubles and helpers, available to unit tests and behind the
//! `test-utils` feature.

mod mock;

use std::sync::Arc;

pub use mock::{ExecutedStatement, MockConnector, MockCursor, MockEvent, MockResult};

use crate::results::Row;
use crate::types::SqlValue;

/// Create a test row with the given column labels and values.
#[must_use]
pub fn create_test_row(columns: &[&str], values: Vec<SqlValue>) -> Row {
    let columns = columns.iter().map(|c| (*c).to_string()).collect();
    Row::new(Arc::new(columns), values)
}
