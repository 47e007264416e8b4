use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::{info, Level};

use dbferry::config::{ConnectionDescriptor, SyncSettings, TableJob};
use dbferry::pipeline::Orchestrator;

#[derive(Parser)]
#[command(name = "dbferry")]
#[command(about = "Batch table synchronization between PostgreSQL databases with CSV mirroring")]
#[command(version = "0.1.0")]
#[command(
    long_about = "Dbferry copies bounded row samples of the configured tables from a source PostgreSQL database into a target database, and mirrors every extracted table to a CSV artifact for inspection. Connection settings come from the environment (SOURCE_DB_* and TARGET_DB_*, optionally via a .env file); the table list and row cap come from the command line. A failing table never stops the remaining tables."
)]
#[command(after_help = "EXAMPLES:
    # Copy up to 10 rows of activity_day into activity_day_backup
    dbferry -t activity_day -n 10 --schema alatech

    # Several tables, explicit target for one of them
    dbferry -t activity_day -t users:users_archive -n 100 --schema public

    # Apply the sample transform and keep CSVs in a custom directory
    dbferry -t activity_day -n 10 --schema alatech --transform --output-dir ./csv")]
struct Cli {
    /// Source table to copy; repeat for multiple tables. Use NAME:TARGET
    /// to name the target table explicitly.
    #[arg(short = 't', long = "table", value_name = "NAME[:TARGET]", required = true)]
    tables: Vec<String>,

    /// Maximum number of rows to read per table
    #[arg(short = 'n', long, value_name = "ROWS")]
    limit: u32,

    /// Schema namespace the source tables live under
    #[arg(long, value_name = "SCHEMA")]
    schema: String,

    /// Directory receiving one CSV artifact per table
    #[arg(long, value_name = "DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Suffix appended to derive target table names
    #[arg(long, value_name = "SUFFIX", default_value = "_backup")]
    target_suffix: String,

    /// Apply the sample transform (increment each row's second field)
    #[arg(long)]
    transform: bool,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Set log level explicitly
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(ValueEnum, Clone, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli);
    load_environment(&cli)?;

    info!("Starting dbferry v{}", env!("CARGO_PKG_VERSION"));

    let settings = build_settings(&cli)?;
    info!(
        "Configuration: {} tables, limit={}, schema={}, transform={}, output_dir={:?}",
        settings.jobs.len(),
        cli.limit,
        settings.schema,
        settings.apply_transform,
        settings.output_dir
    );

    fs::create_dir_all(&settings.output_dir)?;

    let orchestrator = Orchestrator::new(settings);
    match orchestrator.run().await {
        Ok(report) => {
            info!("Summary: {}", report.summary());
        }
        Err(e) => {
            eprintln!("Cannot reach the source database: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn load_environment(cli: &Cli) -> Result<()> {
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))?;
        }
        None => {
            // A missing ./.env is fine; the environment may be set directly.
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

fn build_settings(cli: &Cli) -> Result<SyncSettings> {
    let source = ConnectionDescriptor::from_env("SOURCE")?;
    let target = ConnectionDescriptor::from_env("TARGET")?;

    let jobs = cli
        .tables
        .iter()
        .map(|spec| TableJob::from_spec(spec, &cli.target_suffix, cli.limit))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SyncSettings {
        source,
        target,
        schema: cli.schema.clone(),
        output_dir: cli.output_dir.clone(),
        apply_transform: cli.transform,
        jobs,
    })
}

/// Initialize logging based on CLI configuration
fn initialize_logging(cli: &Cli) {
    let log_level = if let Some(level) = &cli.log_level {
        level.clone().into()
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_target(false)
            .init();
    }
}
