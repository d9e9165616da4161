use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::driver::Connection;

/// A connection shared between the pool's bookkeeping and its current holder.
pub(crate) type SharedConnection = Arc<Mutex<Box<dyn Connection>>>;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) fn next() -> Self {
        ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Point-in-time view of the pool's two sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Idle connections ready to lease
    pub available: usize,
    /// Leased connections, including any pinned to a transaction
    pub in_use: usize,
    /// Configured cap on `available + in_use`
    pub max_size: usize,
}

impl PoolStatus {
    #[must_use]
    pub fn total(&self) -> usize {
        self.available + self.in_use
    }
}
