//! Test helpers for f1db-ingest integration tests
//!
//! - Connectors that hand out connections from the `#[sqlx::test]` pool,
//!   optionally failing first
//! - An in-memory telemetry provider
//! - Session and lap builders
//! - Row queries used by assertions

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use f1db_ingest::config::{IngestConfig, RowErrorPolicy};
use f1db_ingest::db::{Connector, RetryPolicy};
use f1db_ingest::provider::{
    ProviderError, RawLap, RawNumber, SessionData, SessionDescriptor, TelemetryProvider,
};
use f1db_ingest::{IngestJob, IngestOrchestrator};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Connectors
// ============================================================================

/// Detaches a connection from the test pool for each job
#[derive(Clone)]
pub struct PoolConnector {
    pool: PgPool,
}

impl PoolConnector {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }
}

#[async_trait]
impl Connector for PoolConnector {
    type Connection = PgConnection;

    async fn connect(&self) -> Result<PgConnection, sqlx::Error> {
        Ok(self.pool.acquire().await?.detach())
    }
}

/// Refuses the first `failures` attempts, then delegates to the pool
pub struct FlakyConnector {
    inner: PoolConnector,
    failures: u32,
    attempts: AtomicU32,
}

impl FlakyConnector {
    pub fn new(pool: &PgPool, failures: u32) -> Self {
        Self {
            inner: PoolConnector::new(pool),
            failures,
            attempts: AtomicU32::new(0),
        }
    }

    /// Never connects
    pub fn unreachable(pool: &PgPool) -> Self {
        Self::new(pool, u32::MAX)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FlakyConnector {
    type Connection = PgConnection;

    async fn connect(&self) -> Result<PgConnection, sqlx::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        self.inner.connect().await
    }
}

/// Records the server backend pid of every connection it hands out
pub struct TrackingConnector {
    inner: PoolConnector,
    pids: Mutex<Vec<i32>>,
}

impl TrackingConnector {
    pub fn new(pool: &PgPool) -> Self {
        Self {
            inner: PoolConnector::new(pool),
            pids: Mutex::new(Vec::new()),
        }
    }

    pub fn pids(&self) -> Vec<i32> {
        self.pids.lock().expect("pid list lock").clone()
    }
}

#[async_trait]
impl Connector for TrackingConnector {
    type Connection = PgConnection;

    async fn connect(&self) -> Result<PgConnection, sqlx::Error> {
        let mut conn = self.inner.connect().await?;
        let pid: i32 = sqlx::query_scalar("SELECT pg_backend_pid()")
            .fetch_one(&mut conn)
            .await?;
        self.pids.lock().expect("pid list lock").push(pid);
        Ok(conn)
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Serves fixed session data per job; unknown jobs are `NotFound`
#[derive(Default)]
pub struct StaticProvider {
    sessions: HashMap<IngestJob, SessionData>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, job: IngestJob, data: SessionData) -> Self {
        self.sessions.insert(job, data);
        self
    }
}

#[async_trait]
impl TelemetryProvider for StaticProvider {
    async fn load_session(&self, job: &IngestJob) -> Result<SessionData, ProviderError> {
        self.sessions
            .get(job)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(job.clone()))
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn monaco_job() -> IngestJob {
    IngestJob::new(2023, "Monaco", "Race")
}

pub fn bahrain_job() -> IngestJob {
    IngestJob::new(2023, "Bahrain", "Race")
}

pub fn descriptor(event_name: &str, date: (i32, u32, u32), round_number: i32) -> SessionDescriptor {
    SessionDescriptor {
        event_name: event_name.to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
        round_number,
    }
}

pub fn secs(value: f64) -> Option<RawNumber> {
    Some(RawNumber::Float(value))
}

pub fn nan() -> Option<RawNumber> {
    Some(RawNumber::Float(f64::NAN))
}

pub fn lap(driver: &str, number: i64) -> RawLap {
    RawLap {
        driver: Some(driver.to_string()),
        lap_number: Some(RawNumber::Int(number)),
        ..Default::default()
    }
}

/// Two VER laps: a complete one and one with only sector 1
pub fn monaco_laps() -> Vec<RawLap> {
    vec![
        RawLap {
            lap_time: secs(75.0),
            sector1_time: secs(20.0),
            sector2_time: secs(25.0),
            sector3_time: secs(30.0),
            speed_trap: secs(310.0),
            compound: Some("SOFT".to_string()),
            ..lap("VER", 1)
        },
        RawLap {
            lap_time: Some(RawNumber::Marker("NaT".to_string())),
            sector1_time: secs(18.0),
            sector2_time: nan(),
            sector3_time: nan(),
            speed_trap: nan(),
            compound: Some("nan".to_string()),
            ..lap("VER", 2)
        },
    ]
}

pub fn monaco_session() -> SessionData {
    SessionData {
        session: descriptor("Monaco Grand Prix", (2023, 5, 28), 6),
        laps: monaco_laps(),
    }
}

pub fn bahrain_session() -> SessionData {
    SessionData {
        session: descriptor("Bahrain Grand Prix", (2023, 3, 5), 1),
        laps: vec![RawLap {
            lap_time: secs(99.019),
            compound: Some("SOFT".to_string()),
            ..lap("VER", 1)
        }],
    }
}

/// Orchestrator with no retry delay and the given row policy
pub fn orchestrator<C, P>(connector: C, provider: P, policy: RowErrorPolicy) -> IngestOrchestrator<C, P>
where
    C: Connector<Connection = PgConnection>,
    P: TelemetryProvider,
{
    IngestOrchestrator::new(connector, provider, &IngestConfig::default())
        .with_retry(RetryPolicy::new(3, Duration::ZERO))
        .with_row_error_policy(policy)
}

// ============================================================================
// Queries
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredLap {
    pub session_id: i32,
    pub driver: String,
    pub lap_number: i32,
    pub lap_time_ms: Option<i32>,
    pub sector1_time_ms: Option<i32>,
    pub sector2_time_ms: Option<i32>,
    pub sector3_time_ms: Option<i32>,
    pub speed_trap_kmh: Option<i32>,
    pub tyre_compound: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredSession {
    pub session_id: i32,
    pub year: i32,
    pub gp_name: String,
    pub session_type: String,
    pub date: NaiveDate,
    pub round_number: i32,
}

pub async fn ensure_tables(pool: &PgPool) -> sqlx::Result<()> {
    let mut conn = pool.acquire().await?;
    f1db_ingest::db::ensure_schema(&mut *conn).await
}

pub async fn count_sessions(pool: &PgPool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(pool)
        .await
}

pub async fn count_laps(pool: &PgPool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM laps")
        .fetch_one(pool)
        .await
}

pub async fn sessions(pool: &PgPool) -> sqlx::Result<Vec<StoredSession>> {
    sqlx::query_as(
        "SELECT session_id, year, gp_name, session_type, date, round_number FROM sessions ORDER BY session_id",
    )
    .fetch_all(pool)
    .await
}

pub async fn laps(pool: &PgPool) -> sqlx::Result<Vec<StoredLap>> {
    sqlx::query_as(
        r#"
        SELECT session_id, driver, lap_number, lap_time_ms, sector1_time_ms,
               sector2_time_ms, sector3_time_ms, speed_trap_kmh, tyre_compound
        FROM laps
        ORDER BY session_id, driver, lap_number
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Whether the server backend `pid` has exited, waiting up to two seconds
/// for the disconnect to register
pub async fn backend_exited(pool: &PgPool, pid: i32) -> sqlx::Result<bool> {
    for _ in 0..40 {
        let alive: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_stat_activity WHERE pid = $1)")
                .bind(pid)
                .fetch_one(pool)
                .await?;
        if !alive {
            return Ok(true);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Ok(false)
}
