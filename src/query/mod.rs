//! Query execution.
//!
//! Runs SQL against connections obtained from the connection provider and
//! materializes the results.

pub mod executor;

pub use executor::QueryExecutor;
