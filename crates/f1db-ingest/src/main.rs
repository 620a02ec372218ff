//! f1db-ingest - F1 session telemetry ingestion tool

use anyhow::{Context, Result};
use clap::Parser;
use f1db_common::logging::{init_logging, LogConfig, LogLevel};
use f1db_ingest::config::IngestConfig;
use f1db_ingest::db::PgConnector;
use f1db_ingest::{provider, IngestJob, IngestOrchestrator};
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "f1db-ingest")]
#[command(author, version, about = "Ingest F1 session telemetry into PostgreSQL")]
struct Cli {
    /// Sessions to ingest as YEAR:EVENT:SESSION_TYPE (e.g. 2023:Monaco:Race).
    /// Defaults to 2023:Monaco:Race and 2023:Bahrain:Race.
    #[arg(value_name = "JOB")]
    jobs: Vec<IngestJob>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Logging settings from the verbose flag, overridden by the environment
fn log_config(verbose: bool) -> Result<LogConfig> {
    let log_level = if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    LogConfig::builder()
        .level(log_level)
        .filter_directives("sqlx=warn")
        .log_file_prefix("f1db-ingest")
        .build()
        .merge_env()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // `.env` must be in the environment before the log settings are read
    dotenvy::dotenv().ok();

    init_logging(&log_config(cli.verbose)?)?;

    let config = IngestConfig::load().context("Failed to load configuration")?;
    debug!(?config, "Configuration loaded");

    let provider = provider::from_config(&config.provider).context("Failed to create telemetry provider")?;
    let orchestrator = IngestOrchestrator::new(PgConnector::new(&config.database), provider, &config);

    let jobs = if cli.jobs.is_empty() {
        IngestJob::defaults()
    } else {
        cli.jobs
    };

    let summary = orchestrator.run_all(&jobs).await;

    if summary.has_failures() {
        return Ok(ExitCode::FAILURE);
    }

    info!("Ingestion complete");
    Ok(ExitCode::SUCCESS)
}
