//! Connection provider: the single owner of how to reach the database.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{redact_connection_string, Settings};
use crate::db::{Connector, MySqlConnector, Session};
use crate::error::Result;

/// Hands out new connections for one connection descriptor.
///
/// Created once at startup and passed explicitly to whatever needs the
/// database. Every call to [`get_connection`](Self::get_connection) opens
/// a fresh connection that the caller owns and must close.
pub struct ConnectionProvider {
    connector: Arc<dyn Connector>,
    descriptor: String,
    opened: AtomicUsize,
}

impl ConnectionProvider {
    /// Creates a provider that connects to MySQL using the given descriptor.
    pub fn new(connection_string: &str) -> Result<Self> {
        let connector = MySqlConnector::new(connection_string)?;
        Ok(Self::with_connector(
            Arc::new(connector),
            redact_connection_string(connection_string),
        ))
    }

    /// Creates a provider from resolved settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.connection_string)
    }

    /// Creates a provider around any connector.
    ///
    /// `descriptor` is only used for logging and must not contain secrets.
    pub fn with_connector(connector: Arc<dyn Connector>, descriptor: impl Into<String>) -> Self {
        let descriptor = descriptor.into();
        info!("Connection provider ready for {}", descriptor);
        Self {
            connector,
            descriptor,
            opened: AtomicUsize::new(0),
        }
    }

    /// Opens a new connection.
    ///
    /// Any failure to open is returned as a connection error carrying the
    /// driver's cause.
    pub async fn get_connection(&self) -> Result<Box<dyn Session>> {
        debug!("Opening connection to {}", self.descriptor);

        match self.connector.open().await {
            Ok(session) => {
                self.opened.fetch_add(1, Ordering::Relaxed);
                Ok(session)
            }
            Err(e) => {
                warn!("{}", e);
                Err(e)
            }
        }
    }

    /// Returns the redacted descriptor this provider connects with.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Number of connections opened through this provider.
    pub fn connections_opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// Tears the provider down.
    pub fn shutdown(self) {
        info!(
            "Connection provider for {} shut down after {} connection(s)",
            self.descriptor,
            self.connections_opened()
        );
    }
}
