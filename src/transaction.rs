use tracing::{debug, warn};

use crate::driver::{Connection, DriverError};
use crate::error::{Result, SimpleDbError};
use crate::pool::{ConnectionPool, PooledConnection};

struct Pinned {
    pool: ConnectionPool,
    conn: PooledConnection,
}

/// Per-caller transaction state.
///
/// While a transaction is active the context pins one leased connection with
/// auto-commit off, and every statement issued through the context runs on it.
/// Contexts are owned values, so two callers never share transaction state.
///
/// Dropping a context with an active transaction rolls it back and returns the
/// connection to its pool.
#[derive(Default)]
pub struct TransactionContext {
    pinned: Option<Pinned>,
}

impl TransactionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.pinned.is_some()
    }

    pub(crate) fn pinned(&self) -> Option<&PooledConnection> {
        self.pinned.as_ref().map(|p| &p.conn)
    }

    /// Lease a connection from `pool`, switch it to manual commit, and pin it.
    ///
    /// # Errors
    /// Returns `SimpleDbError::AlreadyInTransaction` if this context is already
    /// active, pool errors from the lease, or `SimpleDbError::TransactionFailure`
    /// if auto-commit cannot be disabled (the lease is released first).
    pub fn begin(&mut self, pool: &ConnectionPool) -> Result<()> {
        if self.is_active() {
            return Err(SimpleDbError::AlreadyInTransaction);
        }
        let conn = pool.acquire()?;
        if let Err(source) = conn.with(|c| c.set_auto_commit(false)) {
            pool.release(conn)?;
            return Err(SimpleDbError::TransactionFailure {
                action: "begin",
                source,
            });
        }
        debug!(connection_id = %conn.id(), "transaction started");
        self.pinned = Some(Pinned {
            pool: pool.clone(),
            conn,
        });
        Ok(())
    }

    /// # Errors
    /// Returns `SimpleDbError::NoActiveTransaction` if nothing is pinned, or
    /// `SimpleDbError::TransactionFailure` if the commit fails. The context is
    /// idle afterwards either way.
    pub fn commit(&mut self) -> Result<()> {
        self.finish("commit", |c| c.commit())
    }

    /// # Errors
    /// Returns `SimpleDbError::NoActiveTransaction` if nothing is pinned, or
    /// `SimpleDbError::TransactionFailure` if the rollback fails. The context is
    /// idle afterwards either way.
    pub fn rollback(&mut self) -> Result<()> {
        self.finish("rollback", |c| c.rollback())
    }

    fn finish(
        &mut self,
        action: &'static str,
        instruction: impl FnOnce(&mut dyn Connection) -> Result<(), DriverError>,
    ) -> Result<()> {
        let Pinned { pool, conn } = self
            .pinned
            .take()
            .ok_or(SimpleDbError::NoActiveTransaction)?;

        let outcome = conn.with(|c| settle(c, instruction));
        let id = conn.id();
        let released = pool.release(conn);

        match outcome {
            Ok(()) => {
                debug!(connection_id = %id, action, "transaction finished");
                released
            }
            Err(source) => {
                warn!(connection_id = %id, action, error = %source, "transaction instruction failed");
                Err(SimpleDbError::TransactionFailure { action, source })
            }
        }
    }
}

/// Run `instruction` on a manual-commit connection, then return it to
/// auto-commit without committing anything the instruction left pending.
///
/// After a failed instruction the transaction is rolled back before
/// auto-commit is re-enabled. A connection that cannot be brought back to
/// auto-commit is closed, so the pool discards it on release. Only the
/// instruction's own outcome is reported.
fn settle(
    conn: &mut dyn Connection,
    instruction: impl FnOnce(&mut dyn Connection) -> Result<(), DriverError>,
) -> Result<(), DriverError> {
    let outcome = instruction(conn);
    let restored = match outcome {
        Ok(()) => conn.set_auto_commit(true),
        Err(_) => conn.rollback().and_then(|()| conn.set_auto_commit(true)),
    };

    if restored.is_err() || !conn.auto_commit() {
        warn!(
            error = ?restored.err(),
            "cannot restore auto-commit; closing connection"
        );
        if let Err(err) = conn.close() {
            warn!(error = %err, "failed to close unrecoverable connection");
        }
    }
    outcome
}

impl std::fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("connection", &self.pinned().map(PooledConnection::id))
            .finish()
    }
}

impl Drop for TransactionContext {
    fn drop(&mut self) {
        if let Some(Pinned { pool, conn }) = self.pinned.take() {
            warn!(connection_id = %conn.id(), "transaction context dropped while active; rolling back");
            if let Err(err) = conn.with(|c| settle(c, |c| c.rollback())) {
                warn!(connection_id = %conn.id(), error = %err, "rollback on drop failed");
            }
            let _ = pool.release(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockConnector, MockEvent};

    fn pool() -> (ConnectionPool, MockConnector) {
        let connector = MockConnector::new();
        (ConnectionPool::new(connector.clone(), 2).unwrap(), connector)
    }

    #[test]
    fn begin_twice_is_rejected() {
        let (pool, _) = pool();
        let mut tx = TransactionContext::new();
        tx.begin(&pool).unwrap();
        assert!(matches!(
            tx.begin(&pool),
            Err(SimpleDbError::AlreadyInTransaction)
        ));
        assert_eq!(pool.status().in_use, 1);
        tx.commit().unwrap();
    }

    #[test]
    fn finishing_an_idle_context_is_rejected() {
        let mut tx = TransactionContext::new();
        assert!(matches!(tx.commit(), Err(SimpleDbError::NoActiveTransaction)));
        assert!(matches!(
            tx.rollback(),
            Err(SimpleDbError::NoActiveTransaction)
        ));
    }

    #[test]
    fn commit_restores_auto_commit_and_releases() {
        let (pool, connector) = pool();
        let mut tx = TransactionContext::new();
        tx.begin(&pool).unwrap();
        tx.commit().unwrap();

        assert!(!tx.is_active());
        assert_eq!(pool.status().available, 1);
        assert_eq!(pool.status().in_use, 0);
        let events = connector.events();
        let commit = events.iter().position(|e| matches!(e, MockEvent::Commit(_)));
        let restore = events
            .iter()
            .position(|e| matches!(e, MockEvent::AutoCommit { enabled: true, .. }));
        assert!(commit.unwrap() < restore.unwrap());
    }

    #[test]
    fn failed_commit_still_releases() {
        let (pool, connector) = pool();
        connector.fail_commit(true);
        let mut tx = TransactionContext::new();
        tx.begin(&pool).unwrap();
        let err = tx.commit().unwrap_err();
        assert!(matches!(
            err,
            SimpleDbError::TransactionFailure {
                action: "commit",
                ..
            }
        ));
        assert!(!tx.is_active());
        assert_eq!(pool.status().in_use, 0);
    }

    fn auto_commit_enabled(events: &[MockEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, MockEvent::AutoCommit { enabled: true, .. }))
            .count()
    }

    #[test]
    fn failed_commit_rolls_back_before_returning_the_connection() {
        let (pool, connector) = pool();
        connector.fail_commit(true);
        let mut tx = TransactionContext::new();
        tx.begin(&pool).unwrap();
        assert!(tx.commit().is_err());

        let events = connector.events();
        let rollback = events.iter().position(|e| matches!(e, MockEvent::Rollback(_)));
        let restore = events
            .iter()
            .position(|e| matches!(e, MockEvent::AutoCommit { enabled: true, .. }));
        assert!(rollback.unwrap() < restore.unwrap());

        let lease = pool.acquire().unwrap();
        assert!(lease.with(|c| c.auto_commit()));
        assert_eq!(connector.connections_opened(), 1);
        pool.release(lease).unwrap();
    }

    #[test]
    fn failed_rollback_discards_the_connection_without_committing() {
        let (pool, connector) = pool();
        connector.fail_rollback(true);
        let mut tx = TransactionContext::new();
        tx.begin(&pool).unwrap();
        let err = tx.rollback().unwrap_err();
        assert!(matches!(
            err,
            SimpleDbError::TransactionFailure {
                action: "rollback",
                ..
            }
        ));

        let events = connector.events();
        assert_eq!(auto_commit_enabled(&events), 0);
        assert!(events.iter().any(|e| matches!(e, MockEvent::Closed(_))));
        assert_eq!(pool.status().total(), 0);
    }

    #[test]
    fn connection_stuck_in_manual_commit_is_not_pooled() {
        let (pool, connector) = pool();
        let mut tx = TransactionContext::new();
        tx.begin(&pool).unwrap();
        connector.fail_auto_commit(true);
        tx.commit().unwrap();
        assert!(
            connector
                .events()
                .iter()
                .any(|e| matches!(e, MockEvent::Closed(_)))
        );
        assert_eq!(pool.status().total(), 0);

        connector.fail_auto_commit(false);
        let fresh = pool.acquire().unwrap();
        assert!(fresh.with(|c| c.auto_commit()));
        assert_eq!(connector.connections_opened(), 2);
        pool.release(fresh).unwrap();
    }

    #[test]
    fn failed_rollback_on_drop_does_not_commit() {
        let (pool, connector) = pool();
        connector.fail_rollback(true);
        {
            let mut tx = TransactionContext::new();
            tx.begin(&pool).unwrap();
        }
        assert_eq!(auto_commit_enabled(&connector.events()), 0);
        assert_eq!(pool.status().total(), 0);
    }

    #[test]
    fn dropping_an_active_context_rolls_back() {
        let (pool, connector) = pool();
        {
            let mut tx = TransactionContext::new();
            tx.begin(&pool).unwrap();
        }
        assert!(
            connector
                .events()
                .iter()
                .any(|e| matches!(e, MockEvent::Rollback(_)))
        );
        assert_eq!(pool.status().in_use, 0);
    }
}
