//! Connection management.
//!
//! Centralizes how connections are opened; closing is up to the caller.

pub mod provider;

pub use provider::ConnectionProvider;
