use std::fmt;
use std::sync::{Arc, Weak};

use tracing::warn;

use super::PoolInner;
use super::types::{ConnectionId, SharedConnection};
use crate::driver::Connection;
use crate::helpers::lock_recover;

/// Exclusive lease on one pooled connection.
///
/// Hand it back with [`ConnectionPool::release`](super::ConnectionPool::release).
/// A lease dropped without release returns to its own pool anyway, so a panic
/// or early return never leaks a slot.
pub struct PooledConnection {
    id: ConnectionId,
    conn: SharedConnection,
    pool: Weak<PoolInner>,
    released: bool,
}

impl PooledConnection {
    pub(super) fn new(id: ConnectionId, conn: SharedConnection, pool: &Arc<PoolInner>) -> Self {
        Self {
            id,
            conn,
            pool: Arc::downgrade(pool),
            released: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Run `func` with exclusive access to the underlying connection.
    pub fn with<R>(&self, func: impl FnOnce(&mut dyn Connection) -> R) -> R {
        let mut guard = lock_recover(&self.conn);
        func(guard.as_mut())
    }

    pub(super) fn belongs_to(&self, pool: &Arc<PoolInner>) -> bool {
        std::ptr::eq(self.pool.as_ptr(), Arc::as_ptr(pool))
    }

    pub(super) fn mark_released(&mut self) {
        self.released = true;
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Some(pool) = self.pool.upgrade() {
            warn!(connection_id = %self.id, "lease dropped without release; returning it to the pool");
            let _ = pool.check_in(self.id);
        }
    }
}
