//! Integration tests for churn-revenue.
//!
//! Live tests require a running MySQL database and are skipped when
//! DATABASE_URL is not set. The revenue tests run against the mock connector.

pub mod query_test;
pub mod revenue_test;
