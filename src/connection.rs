use crate::config::ConnectionDescriptor;
use crate::error::FerryError;
use std::fmt;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

/// Server identity returned by the startup probe.
#[derive(Debug)]
pub struct ServerVersion(pub String);

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opens short-lived connections to the source and target databases.
///
/// There is no pool: every operation gets a fresh connection and drops it
/// before returning. Dropping the `Client` terminates the spawned
/// connection task, which is how release works for this driver.
pub struct ConnectionProvider {
    source: ConnectionDescriptor,
    target: ConnectionDescriptor,
}

impl ConnectionProvider {
    pub fn new(source: ConnectionDescriptor, target: ConnectionDescriptor) -> Self {
        Self { source, target }
    }

    pub async fn open_source(&self) -> Result<Client, FerryError> {
        open(&self.source).await
    }

    pub async fn open_target(&self) -> Result<Client, FerryError> {
        open(&self.target).await
    }

    /// Single-shot connectivity check against the source database.
    ///
    /// Issues `SELECT version()` and returns the reported server identity;
    /// the whole run is gated on this succeeding once. No retry.
    pub async fn probe_source(&self) -> Result<ServerVersion, FerryError> {
        let client = self.open_source().await?;
        let row = client
            .query_one("SELECT version()", &[])
            .await
            .map_err(|e| FerryError::connection(format!("Connectivity probe failed: {e}")))?;
        let version: String = row
            .try_get(0)
            .map_err(|e| FerryError::connection(format!("Connectivity probe failed: {e}")))?;
        Ok(ServerVersion(version))
    }
}

async fn open(descriptor: &ConnectionDescriptor) -> Result<Client, FerryError> {
    let mut config = tokio_postgres::Config::new();
    config
        .host(&descriptor.host)
        .port(descriptor.port)
        .user(&descriptor.user)
        .password(&descriptor.password)
        .dbname(&descriptor.database)
        .application_name("dbferry");

    let (client, connection) = config.connect(NoTls).await.map_err(|e| {
        FerryError::connection(format!(
            "Failed to connect to {}:{}/{}: {}",
            descriptor.host, descriptor.port, descriptor.database, e
        ))
    })?;

    // The connection future drives the socket; it resolves once the client
    // is dropped.
    let host = descriptor.host.clone();
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            warn!("Connection to {} terminated with error: {}", host, e);
        }
    });

    debug!(
        "Opened connection to {}:{}/{}",
        descriptor.host, descriptor.port, descriptor.database
    );
    Ok(client)
}
