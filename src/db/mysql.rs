//! MySQL database client implementation.
//!
//! Provides [`MySqlConnector`] and [`MySqlSession`], the sqlx-backed
//! implementations of the [`Connector`] and [`Session`] traits.

use crate::db::{ColumnInfo, Connector, QueryResult, Row, Session, Value};
use crate::error::{ChurnError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlConnection, MySqlRow};
use sqlx::query_builder::Separated;
use sqlx::{
    Column as _, Connection as _, Decode, Executor as _, QueryBuilder, Row as _, Statement as _,
    Type, TypeInfo as _,
};
use std::time::Instant;
use tracing::{debug, warn};

/// Rows per INSERT statement when appending.
const INSERT_BATCH_SIZE: usize = 500;

/// Dialects sqlx can reach through its MySQL driver.
const SUPPORTED_DIALECTS: &[&str] = &["mysql", "mariadb"];

/// Rewrites a `<dialect>+<driver>://...` descriptor into a URL sqlx understands.
///
/// Only the scheme is touched. Everything after `://` is handed to the
/// driver unchanged, so a malformed host or port is reported when the
/// connection is opened.
pub fn driver_url(connection_string: &str) -> Result<String> {
    let (scheme, rest) = connection_string.split_once("://").ok_or_else(|| {
        ChurnError::config("Invalid connection string: expected <driver>://<user>:<password>@<host>:<port>/<database>")
    })?;

    let dialect = scheme
        .split_once('+')
        .map_or(scheme, |(dialect, _driver)| dialect)
        .to_lowercase();
    if !SUPPORTED_DIALECTS.contains(&dialect.as_str()) {
        return Err(ChurnError::config(format!(
            "Unsupported database dialect '{dialect}'. Expected 'mysql' or 'mariadb'"
        )));
    }

    Ok(format!("mysql://{rest}"))
}

/// Opens MySQL connections for one connection descriptor.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    url: String,
}

impl MySqlConnector {
    /// Creates a connector for the given descriptor.
    pub fn new(connection_string: &str) -> Result<Self> {
        Ok(Self {
            url: driver_url(connection_string)?,
        })
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn open(&self) -> Result<Box<dyn Session>> {
        let conn = MySqlConnection::connect(&self.url)
            .await
            .map_err(ChurnError::Connection)?;

        debug!("Opened MySQL connection");
        Ok(Box::new(MySqlSession { conn }))
    }
}

/// A single open MySQL connection.
pub struct MySqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl Session for MySqlSession {
    async fn fetch_table(&mut self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        // Preparing first gives column metadata even when no rows come back.
        let statement = (&mut self.conn)
            .prepare(sql)
            .await
            .map_err(ChurnError::Query)?;

        let columns: Vec<ColumnInfo> = statement
            .columns()
            .iter()
            .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
            .collect();

        let result = statement
            .query()
            .fetch_all(&mut self.conn)
            .await
            .map_err(ChurnError::Query)?;

        let rows = result.iter().map(convert_row).collect::<Result<Vec<Row>>>()?;

        Ok(QueryResult::with_data(columns, rows).with_execution_time(start.elapsed()))
    }

    async fn append_rows(&mut self, table: &str, columns: &[&str], rows: &[Row]) -> Result<u64> {
        let column_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        let mut inserted = 0;

        for (batch, chunk) in rows.chunks(INSERT_BATCH_SIZE).enumerate() {
            let mut builder: QueryBuilder<'_, MySql> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                quote_ident(table),
                column_list
            ));

            builder.push_values(chunk, |mut separated, row| {
                for value in row {
                    push_bind_value(&mut separated, value);
                }
            });

            let outcome = match builder.build().execute(&mut self.conn).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    // Earlier batches are already committed.
                    warn!(
                        "Insert into {} failed at batch {} after {} of {} rows were written",
                        table,
                        batch + 1,
                        inserted,
                        rows.len()
                    );
                    return Err(ChurnError::Query(e));
                }
            };

            debug!("Inserted {} rows into {}", outcome.rows_affected(), table);
            inserted += outcome.rows_affected();
        }

        Ok(inserted)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let MySqlSession { conn } = *self;
        conn.close().await.map_err(ChurnError::Connection)?;
        debug!("Closed MySQL connection");
        Ok(())
    }
}

/// Quotes a MySQL identifier with backticks.
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn push_bind_value<'args>(
    separated: &mut Separated<'_, 'args, MySql, &'static str>,
    value: &'args Value,
) {
    match value {
        Value::Null => separated.push_bind(None::<String>),
        Value::Bool(b) => separated.push_bind(*b),
        Value::Int(i) => separated.push_bind(*i),
        Value::Float(f) => separated.push_bind(*f),
        Value::String(s) => separated.push_bind(s.as_str()),
        Value::Date(d) => separated.push_bind(*d),
        Value::Bytes(b) => separated.push_bind(b.as_slice()),
    };
}

/// Converts a sqlx MySqlRow to our Row type.
///
/// Fails on the first value that cannot be decoded, so a table is never
/// returned with silently blanked cells.
fn convert_row(row: &MySqlRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

fn get<'r, T>(row: &'r MySqlRow, index: usize) -> Result<Option<T>>
where
    T: Decode<'r, MySql> + Type<MySql>,
{
    row.try_get::<Option<T>, _>(index).map_err(ChurnError::Query)
}

fn get_unchecked<'r, T>(row: &'r MySqlRow, index: usize) -> Result<Option<T>>
where
    T: Decode<'r, MySql>,
{
    row.try_get_unchecked::<Option<T>, _>(index)
        .map_err(ChurnError::Query)
}

fn unsigned(v: u64) -> Value {
    match i64::try_from(v) {
        Ok(i) => Value::Int(i),
        Err(_) => Value::String(v.to_string()),
    }
}

/// Converts a single column value from a MySqlRow to our Value type.
///
/// Only SQL NULL becomes [`Value::Null`]; any decode failure is an error.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value> {
    let value = match type_name.to_uppercase().as_str() {
        "BOOLEAN" => get::<bool>(row, index)?.map(Value::Bool),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            get::<i64>(row, index)?.map(Value::Int)
        }

        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => get::<u64>(row, index)?.map(unsigned),

        // Servers disagree on the UNSIGNED flag for these, so skip the type check.
        "YEAR" => get_unchecked::<u16>(row, index)?.map(|y| Value::Int(i64::from(y))),
        "BIT" => get_unchecked::<u64>(row, index)?.map(unsigned),

        "FLOAT" => get::<f32>(row, index)?.map(|v| Value::Float(f64::from(v))),

        "DOUBLE" => get::<f64>(row, index)?.map(Value::Float),

        // DECIMAL travels as text in both protocols.
        "DECIMAL" => get_unchecked::<String>(row, index)?.map(|s| match s.parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::String(s),
        }),

        "DATE" => get::<chrono::NaiveDate>(row, index)?.map(Value::Date),

        "TIME" => get::<chrono::NaiveTime>(row, index)?.map(|t| Value::String(t.to_string())),

        "DATETIME" | "TIMESTAMP" => {
            get::<chrono::NaiveDateTime>(row, index)?.map(|v| Value::String(v.to_string()))
        }

        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            get::<Vec<u8>>(row, index)?.map(Value::Bytes)
        }

        // Character types are sent as text in both protocols.
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET"
        | "JSON" => get_unchecked::<String>(row, index)?.map(Value::String),

        _ => get::<String>(row, index)?.map(Value::String),
    };

    Ok(value.unwrap_or(Value::Null))
}
