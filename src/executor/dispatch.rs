use tracing::debug;

use crate::driver::DriverError;
use crate::error::{Result, SimpleDbError};
use crate::pool::PooledConnection;
use crate::results::{QueryResult, Shape, map_cursor};
use crate::types::SqlValue;

use super::targets::{QueryTarget, StatementKind};

/// Run `sql` with positional `params` and map the outcome to `shape`.
///
/// Inside an active transaction the pinned connection is used and stays
/// pinned. Otherwise a connection is leased for this one statement and
/// released afterwards whether or not the statement succeeded.
///
/// `INSERT` and non-`SELECT` statements yield [`QueryResult::Affected`]
/// regardless of `shape`.
///
/// # Errors
/// - Pool errors when no connection can be leased
/// - `ParamBindingError` when the parameter count or a value is rejected
/// - `StatementExecutionError` wrapping any driver failure
/// - Mapping errors from [`map_cursor`] for `SELECT` statements
pub fn execute(
    target: QueryTarget<'_>,
    sql: &str,
    shape: Shape,
    params: &[SqlValue],
) -> Result<QueryResult> {
    if let Some(conn) = target.tx.and_then(|tx| tx.pinned()) {
        return run_on(conn, sql, shape, params);
    }

    let conn = target.pool.acquire()?;
    let outcome = run_on(&conn, sql, shape, params);
    let released = target.pool.release(conn);
    let result = outcome?;
    released?;
    Ok(result)
}

fn run_on(
    conn: &PooledConnection,
    sql: &str,
    shape: Shape,
    params: &[SqlValue],
) -> Result<QueryResult> {
    let kind = StatementKind::classify(sql);
    debug!(
        connection_id = %conn.id(),
        kind = ?kind,
        params = params.len(),
        shape = %shape,
        "executing statement"
    );

    conn.with(|c| {
        let mut stmt = c.prepare(sql).map_err(|e| SimpleDbError::execution(sql, e))?;

        let expected = stmt.parameter_count();
        if expected != params.len() {
            return Err(SimpleDbError::ParamBindingError(format!(
                "statement expects {expected} parameters but {} were supplied",
                params.len()
            )));
        }
        for (idx, value) in params.iter().enumerate() {
            stmt.bind(idx + 1, value).map_err(|e| match e {
                DriverError::Binding { .. } => SimpleDbError::ParamBindingError(e.to_string()),
                other => SimpleDbError::execution(sql, other),
            })?;
        }

        match kind {
            StatementKind::Select => {
                let mut cursor = stmt
                    .execute_query()
                    .map_err(|e| SimpleDbError::execution(sql, e))?;
                map_cursor(cursor.as_mut(), shape, sql)
            }
            StatementKind::Insert | StatementKind::Other => stmt
                .execute_update()
                .map(QueryResult::Affected)
                .map_err(|e| SimpleDbError::execution(sql, e)),
        }
    })
}
