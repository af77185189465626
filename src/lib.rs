//! churn-revenue - database helpers and synthetic revenue data for the churn project.
//!
//! This library exposes the core modules for use in the binary and integration tests.

pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod revenue;
