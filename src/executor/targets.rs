use crate::pool::ConnectionPool;
use crate::transaction::TransactionContext;

/// Where a statement runs: a pool, plus the caller's transaction context if any.
///
/// When the context has an active transaction its pinned connection is used
/// and the pool is not consulted.
#[derive(Debug, Clone, Copy)]
pub struct QueryTarget<'a> {
    pub(crate) pool: &'a ConnectionPool,
    pub(crate) tx: Option<&'a TransactionContext>,
}

impl<'a> QueryTarget<'a> {
    #[must_use]
    pub fn pool(pool: &'a ConnectionPool) -> Self {
        Self { pool, tx: None }
    }

    #[must_use]
    pub fn with_transaction(pool: &'a ConnectionPool, tx: &'a TransactionContext) -> Self {
        Self {
            pool,
            tx: Some(tx),
        }
    }

    /// True when statements will run on a pinned transaction connection.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some_and(TransactionContext::is_active)
    }
}

impl<'a> From<&'a ConnectionPool> for QueryTarget<'a> {
    fn from(pool: &'a ConnectionPool) -> Self {
        QueryTarget::pool(pool)
    }
}

/// How a statement is executed, decided by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Select,
    /// Any other statement; executed as an update.
    Other,
}

impl StatementKind {
    #[must_use]
    pub fn classify(sql: &str) -> Self {
        let head = sql.trim_start();
        if starts_with_keyword(head, "SELECT") {
            StatementKind::Select
        } else if starts_with_keyword(head, "INSERT") {
            StatementKind::Insert
        } else {
            StatementKind::Other
        }
    }
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
}
