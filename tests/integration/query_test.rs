//! Query execution integration tests.
//!
//! Tests SQL query execution and result handling against a live MySQL database.

use churn_revenue::connection::ConnectionProvider;
use churn_revenue::db::Value;
use churn_revenue::error::ChurnError;
use churn_revenue::query::QueryExecutor;

/// Helper to create a provider for the test database.
fn get_test_provider() -> Option<ConnectionProvider> {
    let url = std::env::var("DATABASE_URL").ok()?;
    ConnectionProvider::new(&url).ok()
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&provider);

    let result = executor
        .query_to_table("SELECT 1 AS num, 'hello' AS greeting")
        .await
        .unwrap();

    assert_eq!(result.column_names(), vec!["num", "greeting"]);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0][0], Value::Int(1));
    assert_eq!(result.rows[0][1], Value::String("hello".to_string()));
}

#[tokio::test]
async fn test_execute_zero_row_select() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&provider);

    let result = executor
        .query_to_table("SELECT 1 AS num, 'x' AS label FROM DUAL WHERE 1 = 0")
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.column_names(), vec!["num", "label"]);
}

#[tokio::test]
async fn test_execute_select_with_null_and_date() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&provider);

    let result = executor
        .query_to_table("SELECT NULL AS nothing, DATE '2020-03-01' AS month, CAST(12.345 AS DECIMAL(10,2)) AS amount")
        .await
        .unwrap();

    assert_eq!(result.rows[0][0], Value::Null);
    assert_eq!(result.rows[0][1].to_display_string(), "2020-03-01");
    assert_eq!(result.rows[0][2], Value::Float(12.35));
}

#[tokio::test]
async fn test_execute_select_with_time_and_year() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&provider);

    let result = executor
        .query_to_table("SELECT CAST('10:20:30' AS TIME) AS t, CAST(2021 AS YEAR) AS y, CAST(NULL AS TIME) AS missing")
        .await
        .unwrap();

    assert_eq!(result.rows[0][0], Value::String("10:20:30".to_string()));
    assert_eq!(result.rows[0][1], Value::Int(2021));
    assert_eq!(result.rows[0][2], Value::Null);
}

#[tokio::test]
async fn test_execute_malformed_query() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&provider);

    let result = executor.query_to_table("SELEC 1 FRM nowhere").await;
    assert!(matches!(result, Err(ChurnError::Query(_))));

    let result = executor
        .query_to_table("SELECT * FROM nonexistent_table_xyz")
        .await;
    let error = result.unwrap_err();
    assert!(error.to_string().contains("nonexistent_table_xyz"));

    // Each failed call still opened and released its own connection
    assert_eq!(provider.connections_opened(), 2);
}
