//! rusqlite-backed connection capability.

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::SqliteConnector;
pub use connection::SqliteConnection;
pub use params::sqlite_value;
