use crate::error::FerryError;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Connection parameters for one database endpoint.
///
/// Two instances exist per run (source and target); both are resolved from
/// the environment before any connection is opened and never change
/// afterwards.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectionDescriptor {
    /// Resolve a descriptor from `<PREFIX>_DB_HOST`, `<PREFIX>_DB_PORT`,
    /// `<PREFIX>_DB_USER`, `<PREFIX>_DB_PASSWORD` and `<PREFIX>_DB_NAME`.
    ///
    /// Port defaults to 5432 when unset; every other variable is required
    /// and the error names the missing one.
    pub fn from_env(prefix: &str) -> Result<Self, FerryError> {
        let port_key = format!("{prefix}_DB_PORT");
        let port = match env::var(&port_key) {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                FerryError::config(format!("{port_key} is not a valid port number: {raw}"))
            })?,
            Err(_) => 5432,
        };

        Ok(Self {
            host: require_env(&format!("{prefix}_DB_HOST"))?,
            port,
            user: require_env(&format!("{prefix}_DB_USER"))?,
            password: require_env(&format!("{prefix}_DB_PASSWORD"))?,
            database: require_env(&format!("{prefix}_DB_NAME"))?,
        })
    }
}

// Manual Debug so connection settings can be logged without leaking credentials.
impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

fn require_env(key: &str) -> Result<String, FerryError> {
    env::var(key)
        .map_err(|_| FerryError::config(format!("Missing required environment variable: {key}")))
}

/// One configured unit of work: copy up to `row_limit` rows of
/// `source_table` into `target_table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableJob {
    pub source_table: String,
    pub target_table: String,
    pub row_limit: u32,
}

impl TableJob {
    /// Parse a CLI table spec.
    ///
    /// `orders` copies into `orders<suffix>`; `orders:orders_archive`
    /// names the target explicitly.
    pub fn from_spec(spec: &str, target_suffix: &str, row_limit: u32) -> Result<Self, FerryError> {
        let (source, target) = match spec.split_once(':') {
            Some((source, target)) => (source, target.to_string()),
            None => (spec, format!("{spec}{target_suffix}")),
        };

        if source.is_empty() {
            return Err(FerryError::config(format!("Invalid table spec: {spec:?}")));
        }
        if target.is_empty() {
            return Err(FerryError::config(format!(
                "Table spec {spec:?} has an empty target name"
            )));
        }

        Ok(Self {
            source_table: source.to_string(),
            target_table: target,
            row_limit,
        })
    }
}

impl fmt::Display for TableJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source_table, self.target_table)
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub source: ConnectionDescriptor,
    pub target: ConnectionDescriptor,
    /// Schema namespace the source tables live under.
    pub schema: String,
    /// Directory receiving one CSV artifact per table.
    pub output_dir: PathBuf,
    /// Apply the reference transform before loading.
    pub apply_transform: bool,
    pub jobs: Vec<TableJob>,
}
