use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::driver::{ColumnMeta, Connection, Connector, Cursor, DriverError, Statement};
use crate::helpers::lock_recover;
use crate::translation::count_placeholders;
use crate::types::SqlValue;

/// Everything a mock connection was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Connected(u64),
    Executed(ExecutedStatement),
    AutoCommit { connection: u64, enabled: bool },
    Commit(u64),
    Rollback(u64),
    Closed(u64),
}

/// One executed statement and the mock connection that served it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub connection: u64,
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// A scripted query result.
#[derive(Debug, Clone, Default)]
pub struct MockResult {
    columns: Vec<ColumnMeta>,
    rows: Vec<Vec<SqlValue>>,
}

impl MockResult {
    #[must_use]
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn row(mut self, values: Vec<SqlValue>) -> Self {
        self.rows.push(values);
        self
    }
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    events: Vec<MockEvent>,
    // (sql fragment, result); the latest matching stub wins
    queries: Vec<(String, MockResult)>,
    affected: Vec<(String, usize)>,
    failing: Vec<String>,
    fail_connect: bool,
    fail_commit: bool,
    fail_rollback: bool,
    fail_auto_commit: bool,
}

impl MockState {
    fn fails(&self, sql: &str) -> bool {
        self.failing.iter().any(|fragment| sql.contains(fragment.as_str()))
    }
}

/// Recording driver for tests.
///
/// Clones share state, so a test keeps one clone to script behavior and
/// inspect events while the pool owns another. Statements match stubs by
/// substring of their SQL. Unstubbed queries return no columns and no rows,
/// and unstubbed updates report zero affected rows.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        lock_recover(&self.state)
    }

    pub fn stub_query(&self, sql_fragment: &str, result: MockResult) {
        self.state().queries.push((sql_fragment.to_string(), result));
    }

    pub fn stub_affected(&self, sql_fragment: &str, rows: usize) {
        self.state().affected.push((sql_fragment.to_string(), rows));
    }

    /// Make every statement containing `sql_fragment` fail at execution.
    pub fn fail_statement(&self, sql_fragment: &str) {
        self.state().failing.push(sql_fragment.to_string());
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state().fail_connect = fail;
    }

    pub fn fail_commit(&self, fail: bool) {
        self.state().fail_commit = fail;
    }

    pub fn fail_rollback(&self, fail: bool) {
        self.state().fail_rollback = fail;
    }

    /// Make every auto-commit toggle fail, leaving the mode unchanged.
    pub fn fail_auto_commit(&self, fail: bool) {
        self.state().fail_auto_commit = fail;
    }

    #[must_use]
    pub fn events(&self) -> Vec<MockEvent> {
        self.state().events.clone()
    }

    #[must_use]
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.state()
            .events
            .iter()
            .filter_map(|event| match event {
                MockEvent::Executed(stmt) => Some(stmt.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.state()
            .events
            .iter()
            .filter(|event| matches!(event, MockEvent::Connected(_)))
            .count()
    }
}

impl std::fmt::Debug for MockConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnector").finish_non_exhaustive()
    }
}

impl Connector for MockConnector {
    fn connect(&self) -> Result<Box<dyn Connection>, DriverError> {
        let mut state = self.state();
        if state.fail_connect {
            return Err(DriverError::Other("scripted connect failure".into()));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.events.push(MockEvent::Connected(id));
        Ok(Box::new(MockConnection {
            id,
            state: Arc::clone(&self.state),
            auto_commit: true,
            closed: false,
        }))
    }
}

struct MockConnection {
    id: u64,
    state: Arc<Mutex<MockState>>,
    auto_commit: bool,
    closed: bool,
}

impl MockConnection {
    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed {
            Err(DriverError::Closed)
        } else {
            Ok(())
        }
    }

    fn record(&self, event: MockEvent) {
        lock_recover(&self.state).events.push(event);
    }
}

impl Connection for MockConnection {
    fn prepare<'c>(&'c mut self, sql: &str) -> Result<Box<dyn Statement + 'c>, DriverError> {
        self.ensure_open()?;
        let count = count_placeholders(sql);
        Ok(Box::new(MockStatement {
            connection: self.id,
            sql: sql.to_string(),
            state: Arc::clone(&self.state),
            params: vec![SqlValue::Null; count],
        }))
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.ensure_open()?;
        if lock_recover(&self.state).fail_auto_commit {
            return Err(DriverError::Other("scripted auto-commit failure".into()));
        }
        self.auto_commit = enabled;
        self.record(MockEvent::AutoCommit {
            connection: self.id,
            enabled,
        });
        Ok(())
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.ensure_open()?;
        if self.auto_commit {
            return Err(DriverError::Other("commit while auto-commit is enabled".into()));
        }
        if lock_recover(&self.state).fail_commit {
            return Err(DriverError::Other("scripted commit failure".into()));
        }
        self.record(MockEvent::Commit(self.id));
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.ensure_open()?;
        if self.auto_commit {
            return Err(DriverError::Other("rollback while auto-commit is enabled".into()));
        }
        if lock_recover(&self.state).fail_rollback {
            return Err(DriverError::Other("scripted rollback failure".into()));
        }
        self.record(MockEvent::Rollback(self.id));
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if !self.closed {
            self.closed = true;
            self.record(MockEvent::Closed(self.id));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

struct MockStatement {
    connection: u64,
    sql: String,
    state: Arc<Mutex<MockState>>,
    params: Vec<SqlValue>,
}

impl MockStatement {
    /// Record the execution and fail it if scripted to.
    fn run(&self) -> Result<MutexGuard<'_, MockState>, DriverError> {
        let mut state = lock_recover(&self.state);
        state.events.push(MockEvent::Executed(ExecutedStatement {
            connection: self.connection,
            sql: self.sql.clone(),
            params: self.params.clone(),
        }));
        if state.fails(&self.sql) {
            return Err(DriverError::Other("scripted statement failure".into()));
        }
        Ok(state)
    }
}

impl Statement for MockStatement {
    fn parameter_count(&self) -> usize {
        self.params.len()
    }

    fn bind(&mut self, index: usize, value: &SqlValue) -> Result<(), DriverError> {
        let slot = index
            .checked_sub(1)
            .and_then(|idx| self.params.get_mut(idx))
            .ok_or_else(|| DriverError::Binding {
                index,
                message: "no such placeholder".into(),
            })?;
        *slot = value.clone();
        Ok(())
    }

    fn execute_update(&mut self) -> Result<usize, DriverError> {
        let state = self.run()?;
        Ok(state
            .affected
            .iter()
            .rev()
            .find(|(fragment, _)| self.sql.contains(fragment.as_str()))
            .map_or(0, |(_, rows)| *rows))
    }

    fn execute_query<'s>(&'s mut self) -> Result<Box<dyn Cursor + 's>, DriverError> {
        let state = self.run()?;
        let result = state
            .queries
            .iter()
            .rev()
            .find(|(fragment, _)| self.sql.contains(fragment.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default();
        Ok(Box::new(MockCursor::new(result.columns, result.rows)))
    }
}

/// In-memory cursor over scripted rows.
#[derive(Debug)]
pub struct MockCursor {
    columns: Vec<ColumnMeta>,
    pending: VecDeque<Vec<SqlValue>>,
    current: Option<Vec<SqlValue>>,
}

impl MockCursor {
    #[must_use]
    pub fn new(columns: Vec<ColumnMeta>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns,
            pending: rows.into(),
            current: None,
        }
    }
}

impl Cursor for MockCursor {
    fn advance(&mut self) -> Result<bool, DriverError> {
        self.current = self.pending.pop_front();
        Ok(self.current.is_some())
    }

    fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    fn value(&self, index: usize) -> Result<SqlValue, DriverError> {
        self.current
            .as_ref()
            .ok_or_else(|| DriverError::Other("cursor is not positioned on a row".into()))?
            .get(index)
            .cloned()
            .ok_or_else(|| DriverError::Other(format!("column index {index} out of range")))
    }
}
