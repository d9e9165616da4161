//! Bounded, fail-fast connection pool.
//!
//! The pool owns two disjoint sets: idle connections (`available`) and leased
//! ones (`in_use`). `available + in_use` never exceeds the configured size, and
//! `acquire` reports [`SimpleDbError::PoolExhausted`] instead of waiting.

pub mod connection;
pub mod types;

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace, warn};

pub use connection::PooledConnection;
pub use types::{ConnectionId, PoolStatus};

use crate::driver::Connector;
use crate::error::{Result, SimpleDbError};
use crate::helpers::lock_recover;
use types::SharedConnection;

#[derive(Default)]
struct PoolState {
    available: VecDeque<(ConnectionId, SharedConnection)>,
    in_use: HashMap<ConnectionId, SharedConnection>,
    /// Slots reserved by `acquire` calls that are still opening a connection.
    opening: usize,
}

pub(crate) struct PoolInner {
    connector: Box<dyn Connector>,
    max_size: usize,
    state: Mutex<PoolState>,
}

impl PoolInner {
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        lock_recover(&self.state)
    }

    /// Move `id` from `in_use` back to `available`; closed connections are dropped instead.
    pub(crate) fn check_in(&self, id: ConnectionId) -> Result<()> {
        let mut state = self.lock_state();
        let Some(conn) = state.in_use.remove(&id) else {
            return Err(SimpleDbError::InvalidRelease { connection_id: id });
        };
        if lock_recover(&conn).is_closed() {
            debug!(connection_id = %id, "discarding closed connection on release");
        } else {
            state.available.push_back((id, conn));
        }
        trace!(
            connection_id = %id,
            available = state.available.len(),
            in_use = state.in_use.len(),
            "released connection"
        );
        Ok(())
    }
}

/// Shared handle to a bounded set of connections. Cloning is cheap and every
/// clone refers to the same pool.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Create an empty pool; connections are opened lazily by `acquire`.
    ///
    /// # Errors
    /// Returns `SimpleDbError::ConfigError` if `max_size` is zero.
    pub fn new(connector: impl Connector + 'static, max_size: usize) -> Result<Self> {
        Self::from_boxed(Box::new(connector), max_size)
    }

    /// Same as [`ConnectionPool::new`] for an already boxed connector.
    ///
    /// # Errors
    /// Returns `SimpleDbError::ConfigError` if `max_size` is zero.
    pub fn from_boxed(connector: Box<dyn Connector>, max_size: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(SimpleDbError::ConfigError(
                "max_pool_size must be at least 1".into(),
            ));
        }
        Ok(Self {
            inner: Arc::new(PoolInner {
                connector,
                max_size,
                state: Mutex::new(PoolState::default()),
            }),
        })
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.inner.max_size
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.lock_state();
        PoolStatus {
            available: state.available.len(),
            in_use: state.in_use.len(),
            max_size: self.inner.max_size,
        }
    }

    /// Lease a connection: an idle one if any, otherwise a newly opened one
    /// while under the cap.
    ///
    /// # Errors
    /// Returns `SimpleDbError::PoolExhausted` when every slot is leased, or
    /// `SimpleDbError::ConnectionCreationFailure` if opening a connection fails.
    pub fn acquire(&self) -> Result<PooledConnection> {
        let mut state = self.inner.lock_state();
        if let Some((id, conn)) = state.available.pop_front() {
            state.in_use.insert(id, Arc::clone(&conn));
            trace!(connection_id = %id, in_use = state.in_use.len(), "leased idle connection");
            return Ok(PooledConnection::new(id, conn, &self.inner));
        }

        if state.in_use.len() + state.opening >= self.inner.max_size {
            debug!(max_size = self.inner.max_size, "connection pool exhausted");
            return Err(SimpleDbError::PoolExhausted {
                max_pool_size: self.inner.max_size,
            });
        }
        state.opening += 1;
        drop(state);

        let opened = self.inner.connector.connect();

        let mut state = self.inner.lock_state();
        state.opening -= 1;
        let conn: SharedConnection = Arc::new(Mutex::new(
            opened.map_err(SimpleDbError::ConnectionCreationFailure)?,
        ));
        let id = ConnectionId::next();
        state.in_use.insert(id, Arc::clone(&conn));
        debug!(
            connection_id = %id,
            in_use = state.in_use.len(),
            max_size = self.inner.max_size,
            "opened new connection"
        );
        Ok(PooledConnection::new(id, conn, &self.inner))
    }

    /// Return a lease to the idle set.
    ///
    /// # Errors
    /// Returns `SimpleDbError::InvalidRelease` if the lease was not handed out by
    /// this pool; neither set is touched and the lease goes back to its own pool.
    pub fn release(&self, mut conn: PooledConnection) -> Result<()> {
        if !conn.belongs_to(&self.inner) {
            warn!(connection_id = %conn.id(), "release of a connection leased from another pool");
            return Err(SimpleDbError::InvalidRelease {
                connection_id: conn.id(),
            });
        }
        self.inner.check_in(conn.id())?;
        conn.mark_released();
        Ok(())
    }

    /// Close every idle and leased connection. Idle ones leave the pool now;
    /// leased ones are discarded when released. Already closed connections are
    /// skipped, and the pool opens fresh connections on later demand.
    ///
    /// # Errors
    /// Every connection is attempted; the first close failure is reported.
    pub fn close_all(&self) -> Result<()> {
        // Connection locks are only taken after the state lock is released
        let (targets, leased): (Vec<(ConnectionId, SharedConnection)>, usize) = {
            let mut guard = self.inner.lock_state();
            let state = &mut *guard;
            let leased = state.in_use.len();
            let targets = state
                .available
                .drain(..)
                .chain(
                    state
                        .in_use
                        .iter()
                        .map(|(id, conn)| (*id, Arc::clone(conn))),
                )
                .collect();
            (targets, leased)
        };

        let mut first_error = None;
        let mut closed = 0usize;
        for (id, conn) in &targets {
            let mut guard = lock_recover(conn);
            if guard.is_closed() {
                continue;
            }
            match guard.close() {
                Ok(()) => closed += 1,
                Err(source) => {
                    warn!(connection_id = %id, error = %source, "failed to close connection");
                    first_error.get_or_insert(SimpleDbError::CloseFailure {
                        connection_id: *id,
                        source,
                    });
                }
            }
        }
        debug!(closed, leased, "closed pool connections");
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockConnector, MockEvent};

    fn pool(max: usize) -> (ConnectionPool, MockConnector) {
        let connector = MockConnector::new();
        let pool = ConnectionPool::new(connector.clone(), max).unwrap();
        (pool, connector)
    }

    #[test]
    fn zero_sized_pool_is_rejected() {
        let err = ConnectionPool::new(MockConnector::new(), 0).unwrap_err();
        assert!(matches!(err, SimpleDbError::ConfigError(_)));
    }

    #[test]
    fn connections_are_created_lazily_and_reused() {
        let (pool, connector) = pool(2);
        assert_eq!(connector.connections_opened(), 0);

        let first = pool.acquire().unwrap();
        let first_id = first.id();
        pool.release(first).unwrap();
        let again = pool.acquire().unwrap();

        assert_eq!(again.id(), first_id);
        assert_eq!(connector.connections_opened(), 1);
        pool.release(again).unwrap();
        assert_eq!(
            pool.status(),
            PoolStatus {
                available: 1,
                in_use: 0,
                max_size: 2
            }
        );
    }

    #[test]
    fn acquire_past_cap_fails_fast() {
        let (pool, _connector) = pool(2);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        let err = pool.acquire().unwrap_err();
        assert!(matches!(err, SimpleDbError::PoolExhausted { max_pool_size: 2 }));
        assert_eq!(pool.status().total(), 2);
        pool.release(a).unwrap();
        pool.release(b).unwrap();
    }

    #[test]
    fn foreign_release_leaves_both_sets_alone() {
        let (pool_a, _) = pool(2);
        let (pool_b, _) = pool(2);
        let mine = pool_a.acquire().unwrap();
        let foreign = pool_b.acquire().unwrap();
        let before = pool_a.status();

        let err = pool_a.release(foreign).unwrap_err();
        assert!(matches!(err, SimpleDbError::InvalidRelease { .. }));
        assert_eq!(pool_a.status(), before);
        // the rejected lease went home to pool B
        assert_eq!(pool_b.status().available, 1);
        assert_eq!(pool_b.status().in_use, 0);
        pool_a.release(mine).unwrap();
    }

    #[test]
    fn dropped_lease_returns_to_pool() {
        let (pool, _) = pool(1);
        {
            let _lease = pool.acquire().unwrap();
            assert_eq!(pool.status().in_use, 1);
        }
        assert_eq!(pool.status().available, 1);
        assert!(pool.acquire().is_ok());
    }

    #[test]
    fn connect_failure_frees_the_reserved_slot() {
        let (pool, connector) = pool(1);
        connector.fail_connect(true);
        let err = pool.acquire().unwrap_err();
        assert!(matches!(err, SimpleDbError::ConnectionCreationFailure(_)));
        connector.fail_connect(false);
        let lease = pool.acquire().unwrap();
        pool.release(lease).unwrap();
    }

    #[test]
    fn close_all_closes_idle_and_leased_once() {
        let (pool, connector) = pool(3);
        let idle = pool.acquire().unwrap();
        let leased = pool.acquire().unwrap();
        pool.release(idle).unwrap();

        pool.close_all().unwrap();
        pool.close_all().unwrap();
        let closes = connector
            .events()
            .into_iter()
            .filter(|e| matches!(e, MockEvent::Closed(_)))
            .count();
        assert_eq!(closes, 2);
        assert_eq!(pool.status().available, 0);

        // the closed lease is discarded rather than returned to the idle set
        pool.release(leased).unwrap();
        assert_eq!(pool.status().total(), 0);
        let fresh = pool.acquire().unwrap();
        assert_eq!(connector.connections_opened(), 3);
        pool.release(fresh).unwrap();
    }

    #[test]
    fn close_all_does_not_block_the_pool_behind_a_busy_connection() {
        use std::sync::mpsc;
        use std::time::Duration;

        let (pool, _) = pool(2);
        let busy = pool.acquire().unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (finish_tx, finish_rx) = mpsc::channel::<()>();

        std::thread::scope(|scope| {
            scope.spawn(move || {
                busy.with(|_| {
                    started_tx.send(()).unwrap();
                    finish_rx.recv().unwrap();
                });
                drop(busy);
            });
            started_rx.recv().unwrap();
            let closer = scope.spawn(|| pool.close_all());
            std::thread::sleep(Duration::from_millis(50));

            // the closer is parked on the busy connection; the pool stays usable
            assert_eq!(pool.status().in_use, 1);
            let other = pool.acquire().unwrap();
            pool.release(other).unwrap();

            finish_tx.send(()).unwrap();
            closer.join().unwrap().unwrap();
        });
        assert_eq!(pool.status().in_use, 0);
    }

    #[test]
    fn concurrent_lease_release_keeps_accounting_consistent() {
        let (pool, _) = pool(4);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        match pool.acquire() {
                            Ok(conn) => {
                                let status = pool.status();
                                assert!(status.total() <= status.max_size);
                                pool.release(conn).unwrap();
                            }
                            Err(SimpleDbError::PoolExhausted { .. }) => {}
                            Err(other) => panic!("unexpected error: {other}"),
                        }
                    }
                });
            }
        });
        let status = pool.status();
        assert_eq!(status.in_use, 0);
        assert!(status.available <= 4);
    }
}
