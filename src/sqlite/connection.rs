use std::fmt;
use std::time::Duration;

use crate::driver::{ColumnMeta, Connection, Cursor, DriverError, Statement};
use crate::types::SqlValue;

use super::params::sqlite_value;
use super::query::{column_type_from_decl, sqlite_extract_value};

/// A rusqlite session exposed through the driver traits.
///
/// `SQLite` has no auto-commit switch, so manual-commit mode is emulated: turning
/// auto-commit off issues `BEGIN`, and `commit`/`rollback` immediately open the
/// next transaction until auto-commit is switched back on.
pub struct SqliteConnection {
    conn: Option<rusqlite::Connection>,
    auto_commit: bool,
    path: String,
}

impl SqliteConnection {
    /// Open `path` and apply the pragmas every pooled session shares.
    ///
    /// # Errors
    /// Returns `DriverError` if the file cannot be opened or the pragmas fail.
    pub fn open(path: &str, busy_timeout: Duration) -> Result<Self, DriverError> {
        let conn = rusqlite::Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        Ok(Self {
            conn: Some(conn),
            auto_commit: true,
            path: path.to_string(),
        })
    }

    fn handle(&self) -> Result<&rusqlite::Connection, DriverError> {
        self.conn.as_ref().ok_or(DriverError::Closed)
    }

    fn ensure_manual_commit(&self, action: &str) -> Result<(), DriverError> {
        if self.auto_commit {
            Err(DriverError::Other(format!(
                "cannot {action} while auto-commit is enabled"
            )))
        } else {
            Ok(())
        }
    }

    fn finish_transaction(&mut self, verb: &str) -> Result<(), DriverError> {
        let conn = self.handle()?;
        if !conn.is_autocommit() {
            conn.execute_batch(verb)?;
        }
        conn.execute_batch("BEGIN")?;
        Ok(())
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .field("auto_commit", &self.auto_commit)
            .field("closed", &self.conn.is_none())
            .finish()
    }
}

impl Connection for SqliteConnection {
    fn prepare<'c>(&'c mut self, sql: &str) -> Result<Box<dyn Statement + 'c>, DriverError> {
        let stmt = self.handle()?.prepare(sql)?;
        let columns = stmt
            .columns()
            .iter()
            .map(|col| ColumnMeta::new(col.name(), column_type_from_decl(col.decl_type())))
            .collect();
        Ok(Box::new(SqliteStatement { stmt, columns }))
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError> {
        if enabled == self.auto_commit {
            return Ok(());
        }
        let conn = self.handle()?;
        if enabled {
            if !conn.is_autocommit() {
                conn.execute_batch("COMMIT")?;
            }
        } else {
            conn.execute_batch("BEGIN")?;
        }
        self.auto_commit = enabled;
        Ok(())
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.ensure_manual_commit("commit")?;
        self.finish_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.ensure_manual_commit("roll back")?;
        self.finish_transaction("ROLLBACK")
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if let Some(conn) = self.conn.take()
            && let Err((conn, err)) = conn.close()
        {
            self.conn = Some(conn);
            return Err(err.into());
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

struct SqliteStatement<'c> {
    stmt: rusqlite::Statement<'c>,
    columns: Vec<ColumnMeta>,
}

impl Statement for SqliteStatement<'_> {
    fn parameter_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    fn bind(&mut self, index: usize, value: &SqlValue) -> Result<(), DriverError> {
        self.stmt
            .raw_bind_parameter(index, sqlite_value(value))
            .map_err(|e| DriverError::Binding {
                index,
                message: e.to_string(),
            })
    }

    fn execute_update(&mut self) -> Result<usize, DriverError> {
        Ok(self.stmt.raw_execute()?)
    }

    fn execute_query<'s>(&'s mut self) -> Result<Box<dyn Cursor + 's>, DriverError> {
        let columns = &self.columns;
        let rows = self.stmt.raw_query();
        Ok(Box::new(SqliteCursor {
            rows,
            columns,
            current: None,
        }))
    }
}

struct SqliteCursor<'s> {
    rows: rusqlite::Rows<'s>,
    columns: &'s [ColumnMeta],
    current: Option<Vec<SqlValue>>,
}

impl Cursor for SqliteCursor<'_> {
    fn advance(&mut self) -> Result<bool, DriverError> {
        let width = self.columns.len();
        match self.rows.next()? {
            Some(row) => {
                let values = (0..width)
                    .map(|idx| sqlite_extract_value(row, idx))
                    .collect::<Result<Vec<_>, _>>()?;
                self.current = Some(values);
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn columns(&self) -> &[ColumnMeta] {
        self.columns
    }

    fn value(&self, index: usize) -> Result<SqlValue, DriverError> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| DriverError::Other("cursor is not positioned on a row".into()))?;
        row.get(index)
            .cloned()
            .ok_or_else(|| DriverError::Other(format!("column index {index} out of range")))
    }
}
