#![cfg(feature = "sqlite")]

use std::thread;

use simple_db::prelude::*;
use tempfile::TempDir;

fn setup(max: usize) -> (TempDir, SimpleDb) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tx.db");
    let db = DbConfig::builder(path.to_string_lossy())
        .max_pool_size(max)
        .build()
        .unwrap();
    db.run(
        "CREATE TABLE ledger (id INTEGER PRIMARY KEY, amount INTEGER NOT NULL)",
        &[],
    )
    .unwrap();
    (dir, db)
}

fn count(db: &SimpleDb) -> i64 {
    db.select_long("SELECT COUNT(*) FROM ledger", &[]).unwrap()
}

#[test]
fn commit_persists_and_rollback_discards() {
    let (_dir, db) = setup(2);
    let mut session = db.session();

    session.start_transaction().unwrap();
    session
        .run("INSERT INTO ledger (amount) VALUES (?)", &params![10])
        .unwrap();
    // visible inside the transaction only
    assert_eq!(
        session.select_long("SELECT COUNT(*) FROM ledger", &[]).unwrap(),
        1
    );
    assert_eq!(count(&db), 0);
    session.rollback().unwrap();
    assert_eq!(count(&db), 0);

    session.start_transaction().unwrap();
    session
        .run("INSERT INTO ledger (amount) VALUES (?)", &params![20])
        .unwrap();
    session.commit().unwrap();
    assert_eq!(count(&db), 1);
    assert_eq!(db.status().in_use, 0);
}

#[test]
fn dropping_a_session_discards_its_writes() {
    let (_dir, db) = setup(2);
    {
        let mut session = db.session();
        session.start_transaction().unwrap();
        session
            .run("INSERT INTO ledger (amount) VALUES (?)", &params![5])
            .unwrap();
    }
    assert_eq!(count(&db), 0);
    assert_eq!(db.status().in_use, 0);
}

#[test]
fn single_slot_pool_reports_exhaustion_to_other_threads() {
    let (_dir, db) = setup(1);
    let mut session = db.session();
    session.start_transaction().unwrap();

    let other = thread::scope(|scope| {
        scope
            .spawn(|| db.run("INSERT INTO ledger (amount) VALUES (1)", &[]))
            .join()
            .unwrap()
    });
    assert!(matches!(other, Err(SimpleDbError::PoolExhausted { .. })));

    session.commit().unwrap();
    db.run("INSERT INTO ledger (amount) VALUES (1)", &[]).unwrap();
    assert_eq!(count(&db), 1);
}

#[test]
fn concurrent_writers_share_the_pool() {
    let (_dir, db) = setup(4);
    thread::scope(|scope| {
        for worker in 0..8_i64 {
            let db = &db;
            scope.spawn(move || {
                for i in 0..25_i64 {
                    loop {
                        match db.run(
                            "INSERT INTO ledger (amount) VALUES (?)",
                            &params![worker * 100 + i],
                        ) {
                            Ok(_) => break,
                            Err(SimpleDbError::PoolExhausted { .. }) => thread::yield_now(),
                            Err(other) => panic!("insert failed: {other}"),
                        }
                    }
                }
            });
        }
    });
    assert_eq!(count(&db), 200);
    let status = db.status();
    assert_eq!(status.in_use, 0);
    assert!(status.available <= 4);
    db.close().unwrap();
}

#[test]
fn failed_commit_does_not_leave_the_pooled_connection_in_a_transaction() {
    let (_dir, db) = setup(1);
    db.run("PRAGMA foreign_keys = ON", &[]).unwrap();
    db.run("CREATE TABLE parent (id INTEGER PRIMARY KEY)", &[])
        .unwrap();
    db.run(
        "CREATE TABLE child (
            id INTEGER PRIMARY KEY,
            parent_id INTEGER REFERENCES parent(id) DEFERRABLE INITIALLY DEFERRED
        )",
        &[],
    )
    .unwrap();

    let mut session = db.session();
    session.start_transaction().unwrap();
    session
        .run("INSERT INTO child (id, parent_id) VALUES (1, 42)", &[])
        .unwrap();
    let err = session.commit().unwrap_err();
    assert!(matches!(
        err,
        SimpleDbError::TransactionFailure {
            action: "commit",
            ..
        }
    ));
    assert_eq!(db.status().in_use, 0);

    // the next caller's write must be durable, not swallowed by the failed transaction
    assert_eq!(db.run("INSERT INTO parent (id) VALUES (1)", &[]).unwrap(), 1);
    let outside = rusqlite::Connection::open(&db.config().database).unwrap();
    let parents: i64 = outside
        .query_row("SELECT COUNT(*) FROM parent", [], |row| row.get(0))
        .unwrap();
    let children: i64 = outside
        .query_row("SELECT COUNT(*) FROM child", [], |row| row.get(0))
        .unwrap();
    assert_eq!(parents, 1);
    assert_eq!(children, 0);
}
