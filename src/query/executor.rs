//! Scoped query execution.
//!
//! Each call opens its own connection through the [`ConnectionProvider`],
//! runs one statement and closes the connection again before returning,
//! whether the statement succeeded or not.

use tracing::{debug, warn};

use crate::connection::ConnectionProvider;
use crate::db::{QueryResult, Row, Session};
use crate::error::Result;

/// Runs queries and appends against the database, one connection per call.
pub struct QueryExecutor<'a> {
    provider: &'a ConnectionProvider,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(provider: &'a ConnectionProvider) -> Self {
        Self { provider }
    }

    /// Executes `sql` and returns the full result table.
    ///
    /// The query text is not escaped or parameterized; callers must only
    /// pass trusted SQL. Execution errors are returned as the driver raised
    /// them. The connection is closed before this returns, and no partial
    /// table is ever returned.
    pub async fn query_to_table(&self, sql: &str) -> Result<QueryResult> {
        let mut conn = self.provider.get_connection().await?;

        let result = conn.fetch_table(sql).await;
        release(conn).await;

        let table = result?;
        debug!(
            "Query returned {} rows in {:?}",
            table.row_count(),
            table.execution_time
        );
        Ok(table)
    }

    /// Appends `rows` to `table` over a single connection.
    ///
    /// Rows are only ever inserted. Returns the number of rows written.
    pub async fn append_rows(&self, table: &str, columns: &[&str], rows: &[Row]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.provider.get_connection().await?;

        let result = conn.append_rows(table, columns, rows).await;
        release(conn).await;

        let inserted = result?;
        debug!("Appended {} rows to {}", inserted, table);
        Ok(inserted)
    }
}

/// Closes a connection. A failed close is logged and otherwise ignored.
async fn release(conn: Box<dyn Session>) {
    if let Err(e) = conn.close().await {
        warn!("Connection did not close cleanly: {}", e);
    }
}
