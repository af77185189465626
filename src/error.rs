//! Error types for churn-revenue.
//!
//! Defines the main error enum used throughout the crate.

use thiserror::Error;

/// Main error type for churn-revenue operations.
#[derive(Error, Debug)]
pub enum ChurnError {
    /// Opening a database connection failed (host unreachable, auth failed, etc.)
    #[error("Failed to connect to the database: {0}")]
    Connection(#[source] sqlx::Error),

    /// Query execution errors (syntax errors, missing tables, etc.), as raised by the driver.
    #[error("{0}")]
    Query(#[source] sqlx::Error),

    /// Configuration errors (missing config file, invalid TOML, unsupported driver, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source row could not be turned into revenue data.
    #[error("Generation error: {0}")]
    Generate(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChurnError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a generation error with the given message.
    pub fn generate(msg: impl Into<String>) -> Self {
        Self::Generate(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Generate(_) => "Generation Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using ChurnError.
pub type Result<T> = std::result::Result<T, ChurnError>;
