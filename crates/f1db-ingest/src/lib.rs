//! F1 telemetry ingestion
//!
//! Loads per-session lap telemetry from a provider and writes it into a
//! PostgreSQL database, provisioning the tables on first use.
//!
//! # Guarantees
//!
//! - **Idempotent**: re-running a job never duplicates a session or a lap;
//!   lap values from the latest run win.
//! - **Atomic per job**: a job commits all of its rows or none of them
//!   (unless laps are explicitly skipped, see [`config::RowErrorPolicy`]).
//! - **Bounded retry**: the database connection is retried a fixed number of
//!   times with a fixed delay, then the job fails.
//!
//! # Example
//!
//! ```no_run
//! use f1db_ingest::{config::IngestConfig, db::PgConnector, job::IngestJob, provider};
//! use f1db_ingest::orchestrator::IngestOrchestrator;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::load()?;
//!     let orchestrator = IngestOrchestrator::new(
//!         PgConnector::new(&config.database),
//!         provider::from_config(&config.provider)?,
//!         &config,
//!     );
//!
//!     let summary = orchestrator.run_all(&IngestJob::defaults()).await;
//!     tracing::info!(succeeded = summary.succeeded, failed = summary.failed, "Run finished");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod job;
pub mod normalize;
pub mod orchestrator;
pub mod provider;

pub use error::{IngestError, IngestResult};
pub use job::IngestJob;
pub use orchestrator::{IngestOrchestrator, IngestOutcome, RunSummary};
