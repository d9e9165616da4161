use std::time::Duration;

use crate::config::DbConfig;
use crate::driver::{Connection, Connector, DriverError};

use super::connection::SqliteConnection;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens `SQLite` sessions on the file named by the configured database.
///
/// Host, port, and credentials have no meaning for `SQLite` and are ignored.
/// Each pooled session opens the file independently, so `:memory:` yields a
/// separate empty database per connection; use a file path to share data.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: String,
    busy_timeout: Duration,
}

impl SqliteConnector {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    #[must_use]
    pub fn from_config(config: &DbConfig) -> Self {
        Self::new(config.database.clone())
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Connector for SqliteConnector {
    fn connect(&self) -> Result<Box<dyn Connection>, DriverError> {
        let conn = SqliteConnection::open(&self.path, self.busy_timeout)?;
        Ok(Box::new(conn))
    }
}
