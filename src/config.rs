use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimpleDbError};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_MAX_POOL_SIZE: usize = 10;

/// Connection settings for a [`SimpleDb`](crate::SimpleDb). Fixed once the
/// database handle is built.
///
/// For `SQLite`, `database` is the file path and the network fields are unused.
/// The password is never serialized and never printed by `Debug`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub max_pool_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: String::new(),
            username: String::new(),
            password: String::new(),
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
        }
    }
}

impl DbConfig {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn builder(database: impl Into<String>) -> DbConfigBuilder {
        DbConfigBuilder::new(database)
    }

    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `SimpleDbError::ConfigError` if the JSON is malformed or the
    /// result fails [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DbConfig = serde_json::from_str(json)
            .map_err(|e| SimpleDbError::ConfigError(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `SimpleDbError::ConfigError` for an empty database name or a
    /// zero pool size.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(SimpleDbError::ConfigError(
                "database is required".to_string(),
            ));
        }
        if self.max_pool_size == 0 {
            return Err(SimpleDbError::ConfigError(
                "max_pool_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port/database`, without credentials.
    #[must_use]
    pub fn connection_url(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("max_pool_size", &self.max_pool_size)
            .finish()
    }
}

/// Fluent builder for [`DbConfig`].
#[derive(Debug, Clone)]
pub struct DbConfigBuilder {
    config: DbConfig,
}

impl DbConfigBuilder {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            config: DbConfig::new(database),
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = username.into();
        self.config.password = password.into();
        self
    }

    #[must_use]
    pub fn max_pool_size(mut self, max_pool_size: usize) -> Self {
        self.config.max_pool_size = max_pool_size;
        self
    }

    #[must_use]
    pub fn finish(self) -> DbConfig {
        self.config
    }

    /// Build a [`SimpleDb`](crate::SimpleDb) over `SQLite`.
    ///
    /// # Errors
    /// Returns `SimpleDbError::ConfigError` if the configuration is invalid.
    #[cfg(feature = "sqlite")]
    pub fn build(self) -> Result<crate::SimpleDb> {
        crate::SimpleDb::new(self.finish())
    }
}
