//! Ingestion orchestrator
//!
//! Runs one job end to end: connect, provision tables, fetch telemetry, then
//! write the session and its laps inside a single transaction. Jobs in a batch
//! run one after another and a failed job does not stop the batch.

use f1db_common::NewSession;
use sqlx::{Connection, PgConnection};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{IngestConfig, RowErrorPolicy};
use crate::db::{acquire, ensure_schema, resolve_session, upsert_lap, Connector, LapWrite, RetryPolicy};
use crate::error::{IngestError, IngestResult};
use crate::job::IngestJob;
use crate::normalize::normalize;
use crate::provider::{RawLap, SessionData, TelemetryProvider};

/// What a successful job wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestOutcome {
    pub session_id: i32,
    /// `false` when the session row already existed
    pub session_created: bool,
    pub laps_inserted: usize,
    pub laps_updated: usize,
    /// Laps rolled back under [`RowErrorPolicy::Skip`]
    pub laps_skipped: usize,
}

impl IngestOutcome {
    pub fn laps_written(&self) -> usize {
        self.laps_inserted + self.laps_updated
    }

    fn record(&mut self, write: LapWrite) {
        match write {
            LapWrite::Inserted => self.laps_inserted += 1,
            LapWrite::Updated => self.laps_updated += 1,
        }
    }
}

/// Per-batch tally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Coordinates connection, provider and store for each job
pub struct IngestOrchestrator<C, P> {
    connector: C,
    provider: P,
    retry: RetryPolicy,
    row_error_policy: RowErrorPolicy,
}

impl<C, P> IngestOrchestrator<C, P>
where
    C: Connector<Connection = PgConnection>,
    P: TelemetryProvider,
{
    pub fn new(connector: C, provider: P, config: &IngestConfig) -> Self {
        Self {
            connector,
            provider,
            retry: config.retry.policy(),
            row_error_policy: config.row_error_policy,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_row_error_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.row_error_policy = policy;
        self
    }

    /// Run every job in order, logging each result
    pub async fn run_all(&self, jobs: &[IngestJob]) -> RunSummary {
        info!(jobs = jobs.len(), "Starting ingestion run");

        let mut summary = RunSummary::default();
        for job in jobs {
            match self.ingest(job).await {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    info!(
                        job = %job,
                        session_id = outcome.session_id,
                        laps_inserted = outcome.laps_inserted,
                        laps_updated = outcome.laps_updated,
                        laps_skipped = outcome.laps_skipped,
                        "✓ Session processed"
                    );
                },
                Err(e) => {
                    summary.failed += 1;
                    error!(job = %job, kind = e.kind(), "✗ Ingestion failed: {}", e);
                },
            }
        }

        info!(
            "Ingestion run completed: {} succeeded, {} failed",
            summary.succeeded, summary.failed
        );
        summary
    }

    /// Ingest a single job.
    ///
    /// Either every write for the job is committed or none is, except for laps
    /// skipped under [`RowErrorPolicy::Skip`]. The connection is closed before
    /// returning on every path.
    #[instrument(skip_all, fields(job = %job))]
    pub async fn ingest(&self, job: &IngestJob) -> IngestResult<IngestOutcome> {
        let mut conn = acquire(&self.connector, &self.retry).await?;

        let result = self.ingest_on(&mut conn, job).await;

        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close database connection");
        }
        result
    }

    async fn ingest_on(&self, conn: &mut PgConnection, job: &IngestJob) -> IngestResult<IngestOutcome> {
        ensure_schema(conn).await.map_err(IngestError::Schema)?;

        let data = self.provider.load_session(job).await?;
        debug!(
            event = %data.session.event_name,
            round = data.session.round_number,
            laps = data.laps.len(),
            "Telemetry loaded"
        );
        let session = new_session(job, &data);

        let mut tx = conn.begin().await.map_err(IngestError::Transaction)?;

        match self.write_session(&mut tx, &session, &data.laps).await {
            Ok(outcome) => {
                tx.commit().await.map_err(IngestError::Transaction)?;
                Ok(outcome)
            },
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            },
        }
    }

    async fn write_session(
        &self,
        tx: &mut PgConnection,
        session: &NewSession,
        laps: &[RawLap],
    ) -> IngestResult<IngestOutcome> {
        let resolution = resolve_session(tx, session).await?;
        let session_id = resolution.id();

        let mut outcome = IngestOutcome {
            session_id,
            session_created: resolution.is_new(),
            ..Default::default()
        };

        for (index, raw) in laps.iter().enumerate() {
            let row = normalize(raw);

            match self.row_error_policy {
                RowErrorPolicy::Abort => {
                    let write = upsert_lap(tx, session_id, &row, index).await?;
                    outcome.record(write);
                },
                RowErrorPolicy::Skip => {
                    let mut savepoint = Connection::begin(&mut *tx)
                        .await
                        .map_err(IngestError::Transaction)?;

                    match upsert_lap(&mut savepoint, session_id, &row, index).await {
                        Ok(write) => {
                            savepoint.commit().await.map_err(IngestError::Transaction)?;
                            outcome.record(write);
                        },
                        Err(e) => {
                            savepoint.rollback().await.map_err(IngestError::Transaction)?;
                            warn!(index, error = %e, "Skipping lap");
                            outcome.laps_skipped += 1;
                        },
                    }
                },
            }
        }

        Ok(outcome)
    }
}

/// Session row for `job`; the event name and round come from the provider
fn new_session(job: &IngestJob, data: &SessionData) -> NewSession {
    NewSession {
        year: job.year,
        gp_name: data.session.event_name.clone(),
        session_type: job.session_type.clone(),
        date: data.session.date,
        round_number: data.session.round_number,
    }
}
