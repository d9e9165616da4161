use simple_db::prelude::*;
use simple_db::Connection;
use simple_db::test_utils::{MockConnector, MockEvent};

fn mock_db() -> (SimpleDb, MockConnector) {
    let connector = MockConnector::new();
    let config = DbConfig::builder("mock").max_pool_size(4).finish();
    let db = SimpleDb::with_connector(config, connector.clone()).unwrap();
    (db, connector)
}

/// Lease every idle connection and check none was left in manual-commit mode.
fn assert_pooled_connections_auto_commit(db: &SimpleDb) {
    let idle = db.status().available;
    let leases: Vec<_> = (0..idle).map(|_| db.pool().acquire().unwrap()).collect();
    for lease in &leases {
        assert!(lease.with(|c| c.auto_commit()), "{lease:?} left in manual-commit mode");
    }
    for lease in leases {
        db.pool().release(lease).unwrap();
    }
}

#[test]
fn begin_twice_fails() {
    let (db, _) = mock_db();
    let mut session = db.session();
    session.start_transaction().unwrap();
    assert!(matches!(
        session.start_transaction(),
        Err(SimpleDbError::AlreadyInTransaction)
    ));
    session.rollback().unwrap();
}

#[test]
fn finishing_without_begin_fails() {
    let (db, _) = mock_db();
    let mut session = db.session();
    assert!(matches!(
        session.commit(),
        Err(SimpleDbError::NoActiveTransaction)
    ));
    assert!(matches!(
        session.rollback(),
        Err(SimpleDbError::NoActiveTransaction)
    ));
}

#[test]
fn statements_inside_a_transaction_share_the_pinned_connection() {
    let (db, connector) = mock_db();
    let mut session = db.session();
    session.start_transaction().unwrap();
    session.run("INSERT INTO t VALUES (?)", &params![1]).unwrap();
    session
        .gen_sql()
        .append("UPDATE t SET v = ?")
        .append_with("WHERE id = ?", params![2, 1])
        .update()
        .unwrap();
    // a direct statement on the db handle leases a different connection
    db.run("UPDATE other SET v = 0", &[]).unwrap();
    session.commit().unwrap();

    let executed = connector.executed();
    assert_eq!(executed.len(), 3);
    assert_eq!(executed[0].connection, executed[1].connection);
    assert_ne!(executed[0].connection, executed[2].connection);

    let events = connector.events();
    assert!(events.iter().any(|e| matches!(
        e,
        MockEvent::AutoCommit {
            enabled: false,
            ..
        }
    )));
    assert!(events.iter().any(|e| matches!(e, MockEvent::Commit(_))));
    assert_eq!(db.status().in_use, 0);
}

#[test]
fn commit_failure_is_reported_and_the_connection_released() {
    let (db, connector) = mock_db();
    connector.fail_commit(true);
    let mut session = db.session();
    session.start_transaction().unwrap();
    session.run("DELETE FROM t", &[]).unwrap();
    let err = session.commit().unwrap_err();
    assert!(matches!(err, SimpleDbError::TransactionFailure { .. }));
    assert!(!session.in_transaction());
    assert_eq!(db.status().in_use, 0);
    assert_pooled_connections_auto_commit(&db);

    // the session can start over
    connector.fail_commit(false);
    session.start_transaction().unwrap();
    session.commit().unwrap();
}

#[test]
fn dropped_session_rolls_back() {
    let (db, connector) = mock_db();
    {
        let mut session = db.session();
        session.start_transaction().unwrap();
        session.run("DELETE FROM t", &[]).unwrap();
    }
    assert!(
        connector
            .events()
            .iter()
            .any(|e| matches!(e, MockEvent::Rollback(_)))
    );
    assert_eq!(db.status().in_use, 0);
}

#[test]
fn failed_rollback_never_commits_or_repools_the_connection() {
    let (db, connector) = mock_db();
    connector.fail_rollback(true);
    let mut session = db.session();
    session.start_transaction().unwrap();
    session.run("DELETE FROM t", &[]).unwrap();
    assert!(matches!(
        session.rollback(),
        Err(SimpleDbError::TransactionFailure {
            action: "rollback",
            ..
        })
    ));

    let events = connector.events();
    assert!(!events.iter().any(|e| matches!(
        e,
        MockEvent::AutoCommit {
            enabled: true,
            ..
        }
    )));
    assert!(events.iter().any(|e| matches!(e, MockEvent::Closed(_))));
    assert_eq!(db.status().total(), 0);

    connector.fail_rollback(false);
    db.run("UPDATE t SET v = 1", &[]).unwrap();
    assert_eq!(connector.connections_opened(), 2);
    assert_pooled_connections_auto_commit(&db);
}

#[test]
fn unrestorable_auto_commit_discards_the_connection() {
    let (db, connector) = mock_db();
    let mut session = db.session();
    session.start_transaction().unwrap();
    session.run("INSERT INTO t VALUES (1)", &[]).unwrap();
    connector.fail_auto_commit(true);
    session.commit().unwrap();
    connector.fail_auto_commit(false);

    assert_eq!(db.status().total(), 0);
    db.run("UPDATE t SET v = 2", &[]).unwrap();
    assert_pooled_connections_auto_commit(&db);
}
