//! Database abstraction layer.
//!
//! A [`Connector`] opens sessions; a [`Session`] is one open connection,
//! owned by a single caller and closed when that caller is done with it.

mod mock;
mod mysql;
mod types;

pub use mock::{FailingConnector, MockConnector};
pub use mysql::{driver_url, MySqlConnector, MySqlSession};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Opens new database sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new session. Failures are reported as connection errors.
    async fn open(&self) -> Result<Box<dyn Session>>;
}

/// One open database connection.
#[async_trait]
pub trait Session: Send {
    /// Executes a SQL query and returns every row it produces.
    ///
    /// The query text is sent as-is, with no escaping or parameters.
    async fn fetch_table(&mut self, sql: &str) -> Result<QueryResult>;

    /// Appends rows to `table` using bound parameters. Returns the number of rows inserted.
    async fn append_rows(&mut self, table: &str, columns: &[&str], rows: &[Row]) -> Result<u64>;

    /// Closes the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}
