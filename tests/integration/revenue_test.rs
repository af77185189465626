//! Revenue generation tests.
//!
//! Runs the full read-generate-append flow against the mock connector.

use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate};
use churn_revenue::connection::ConnectionProvider;
use churn_revenue::db::{ColumnInfo, MockConnector, QueryResult, Value};
use churn_revenue::error::ChurnError;
use churn_revenue::query::QueryExecutor;
use churn_revenue::revenue::{
    generate_revenue, RevenueGenerator, CUSTOMERS_QUERY, REVENUE_COLUMNS, REVENUE_TABLE,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn customers(rows: Vec<Vec<Value>>) -> QueryResult {
    QueryResult::with_data(
        vec![
            ColumnInfo::new("customerID", "VARCHAR"),
            ColumnInfo::new("tenure", "INT"),
            ColumnInfo::new("MonthlyCharges", "DECIMAL"),
        ],
        rows,
    )
}

fn generator(seed: u64) -> RevenueGenerator<StdRng> {
    RevenueGenerator::new(StdRng::seed_from_u64(seed)).unwrap()
}

fn date_of(value: &Value) -> NaiveDate {
    match value {
        Value::Date(d) => *d,
        other => panic!("Expected Date, got {:?}", other),
    }
}

fn amount_of(value: &Value) -> f64 {
    match value {
        Value::Float(f) => *f,
        other => panic!("Expected Float, got {:?}", other),
    }
}

#[tokio::test]
async fn test_single_customer_three_months() {
    let mock = MockConnector::new().with_result(
        CUSTOMERS_QUERY,
        customers(vec![vec![
            Value::from("7590-VHVEG"),
            Value::Int(3),
            Value::Float(100.0),
        ]]),
    );
    let provider = ConnectionProvider::with_connector(Arc::new(mock.clone()), "mock://");
    let executor = QueryExecutor::new(&provider);

    let summary = generate_revenue(&executor, &mut generator(5), false)
        .await
        .unwrap();

    assert_eq!(summary.customers, 1);
    assert_eq!(summary.rows_generated, 3);
    assert_eq!(summary.rows_written, 3);

    let written = mock.appended(REVENUE_TABLE);
    assert_eq!(written.len(), 3);
    assert_eq!(mock.appended_columns(REVENUE_TABLE), REVENUE_COLUMNS.to_vec());

    for row in &written {
        assert_eq!(row[0], Value::from("7590-VHVEG"));
        let amount = amount_of(&row[2]);
        assert!((0.0..=115.0).contains(&amount), "amount {amount}");
    }

    let months: Vec<NaiveDate> = written.iter().map(|row| date_of(&row[1])).collect();
    for pair in months.windows(2) {
        assert_eq!(pair[0].checked_add_months(Months::new(1)), Some(pair[1]));
    }
    assert!(months.iter().all(|m| m.day() == 1));

    // One connection to read, one to write, both closed
    assert_eq!(mock.opened(), 2);
    assert_eq!(mock.closed(), 2);
}

#[tokio::test]
async fn test_nulls_fall_back_to_defaults() {
    let mock = MockConnector::new().with_result(
        CUSTOMERS_QUERY,
        customers(vec![
            vec![Value::from("a"), Value::Null, Value::Float(50.0)],
            vec![Value::from("b"), Value::Int(0), Value::Null],
            vec![Value::from("c"), Value::Int(2), Value::from("20.25")],
        ]),
    );
    let provider = ConnectionProvider::with_connector(Arc::new(mock.clone()), "mock://");
    let executor = QueryExecutor::new(&provider);

    let summary = generate_revenue(&executor, &mut generator(9), false)
        .await
        .unwrap();

    assert_eq!(summary.rows_written, 4);

    let written = mock.appended(REVENUE_TABLE);
    let ids: Vec<String> = written.iter().map(|r| r[0].to_display_string()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "c"]);
    assert_eq!(amount_of(&written[1][2]), 0.0);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let mock = MockConnector::new().with_result(
        CUSTOMERS_QUERY,
        customers(vec![vec![Value::from("a"), Value::Int(12), Value::Float(70.7)]]),
    );
    let provider = ConnectionProvider::with_connector(Arc::new(mock.clone()), "mock://");
    let executor = QueryExecutor::new(&provider);

    let summary = generate_revenue(&executor, &mut generator(1), true)
        .await
        .unwrap();

    assert_eq!(summary.rows_generated, 12);
    assert_eq!(summary.rows_written, 0);
    assert!(mock.appended(REVENUE_TABLE).is_empty());
    assert_eq!(mock.opened(), 1);
}

#[tokio::test]
async fn test_missing_customers_table_propagates() {
    let mock = MockConnector::new()
        .with_query_error(CUSTOMERS_QUERY, "Table 'churn_project.customers' doesn't exist");
    let provider = ConnectionProvider::with_connector(Arc::new(mock.clone()), "mock://");
    let executor = QueryExecutor::new(&provider);

    let result = generate_revenue(&executor, &mut generator(1), false).await;

    assert!(matches!(result, Err(ChurnError::Query(_))));
    assert!(mock.appended(REVENUE_TABLE).is_empty());
    assert_eq!(mock.closed(), 1);
}

#[tokio::test]
async fn test_no_customers_writes_nothing() {
    let mock = MockConnector::new().with_result(CUSTOMERS_QUERY, customers(vec![]));
    let provider = ConnectionProvider::with_connector(Arc::new(mock.clone()), "mock://");
    let executor = QueryExecutor::new(&provider);

    let summary = generate_revenue(&executor, &mut generator(1), false)
        .await
        .unwrap();

    assert_eq!(summary.customers, 0);
    assert_eq!(summary.rows_written, 0);
    assert_eq!(mock.opened(), 1);
}
