//! Mock database connectors for testing.
//!
//! Provides an in-memory connector that serves canned query results and
//! records appended rows, plus a connector that never connects.

use super::{Connector, QueryResult, Row, Session};
use crate::error::{ChurnError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MockState {
    results: HashMap<String, QueryResult>,
    failing_queries: HashMap<String, String>,
    failing_tables: HashMap<String, String>,
    appended: HashMap<String, Vec<Row>>,
    appended_columns: HashMap<String, Vec<String>>,
    close_error: Option<String>,
    opened: usize,
    closed: usize,
}

/// A connector whose sessions answer from an in-memory table of canned results.
///
/// Clones share state, so a test can keep a handle after giving one to a provider.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Creates a mock connector with no canned results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `result` whenever `sql` is executed.
    pub fn with_result(self, sql: &str, result: QueryResult) -> Self {
        self.lock().results.insert(normalize(sql), result);
        self
    }

    /// Fails with a query error whenever `sql` is executed.
    pub fn with_query_error(self, sql: &str, message: &str) -> Self {
        self.lock()
            .failing_queries
            .insert(normalize(sql), message.to_string());
        self
    }

    /// Fails with a query error whenever rows are appended to `table`.
    pub fn with_append_error(self, table: &str, message: &str) -> Self {
        self.lock()
            .failing_tables
            .insert(table.to_string(), message.to_string());
        self
    }

    /// Fails every session close with a connection error.
    pub fn with_close_error(self, message: &str) -> Self {
        self.lock().close_error = Some(message.to_string());
        self
    }

    /// Number of sessions opened so far.
    pub fn opened(&self) -> usize {
        self.lock().opened
    }

    /// Number of explicit close attempts so far, failed ones included.
    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    /// Rows appended to `table`, in insertion order.
    pub fn appended(&self, table: &str) -> Vec<Row> {
        self.lock().appended.get(table).cloned().unwrap_or_default()
    }

    /// Column list used by the last append to `table`.
    pub fn appended_columns(&self, table: &str) -> Vec<String> {
        self.lock()
            .appended_columns
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self) -> Result<Box<dyn Session>> {
        self.lock().opened += 1;
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
}

impl MockSession {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn fetch_table(&mut self, sql: &str) -> Result<QueryResult> {
        let key = normalize(sql);
        let state = self.lock();

        if let Some(message) = state.failing_queries.get(&key) {
            return Err(ChurnError::Query(sqlx::Error::Protocol(message.clone())));
        }

        state.results.get(&key).cloned().ok_or_else(|| {
            ChurnError::Query(sqlx::Error::Protocol(format!(
                "no mock result for query: {sql}"
            )))
        })
    }

    async fn append_rows(&mut self, table: &str, columns: &[&str], rows: &[Row]) -> Result<u64> {
        let mut state = self.lock();

        if let Some(message) = state.failing_tables.get(table) {
            return Err(ChurnError::Query(sqlx::Error::Protocol(message.clone())));
        }

        state.appended_columns.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        state
            .appended
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());

        Ok(rows.len() as u64)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut state = self.lock();
        state.closed += 1;

        match &state.close_error {
            Some(message) => Err(ChurnError::Connection(sqlx::Error::Protocol(message.clone()))),
            None => Ok(()),
        }
    }
}

/// A connector whose every open attempt fails.
#[derive(Debug, Clone, Default)]
pub struct FailingConnector {
    attempts: Arc<Mutex<usize>>,
}

impl FailingConnector {
    /// Creates a connector that refuses every connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open attempts so far.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Connector for FailingConnector {
    async fn open(&self) -> Result<Box<dyn Session>> {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Err(ChurnError::Connection(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))))
    }
}

fn normalize(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim().to_string()
}
