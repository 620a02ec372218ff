//! Connection acquisition with fixed-delay retry

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::ConnectOptions;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::DatabaseConfig;
use crate::error::ConnectionError;

/// Opens one database connection per call
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Send;

    async fn connect(&self) -> Result<Self::Connection, sqlx::Error>;
}

#[async_trait]
impl<'a, C> Connector for &'a C
where
    C: Connector + ?Sized,
{
    type Connection = C::Connection;

    async fn connect(&self) -> Result<Self::Connection, sqlx::Error> {
        (**self).connect().await
    }
}

/// Connector for the configured PostgreSQL server
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
}

impl PgConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password);

        Self { options }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgConnection;

    async fn connect(&self) -> Result<PgConnection, sqlx::Error> {
        self.options.connect().await
    }
}

/// How often and how patiently to retry a failed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Longest time [`acquire`] can spend sleeping
    pub fn max_wait(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

/// Open a connection, retrying up to `policy.max_attempts` times in total.
///
/// Sleeps `policy.delay` between attempts, never after the last one. A policy
/// of zero attempts still makes one.
pub async fn acquire<C>(connector: &C, policy: &RetryPolicy) -> Result<C::Connection, ConnectionError>
where
    C: Connector + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match connector.connect().await {
            Ok(conn) => {
                debug!(attempt, max_attempts, "Database connection established");
                return Ok(conn);
            },
            Err(e) if attempt < max_attempts => {
                warn!(
                    attempt,
                    max_attempts,
                    error = %e,
                    retry_in_secs = policy.delay.as_secs_f64(),
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            },
            Err(e) => {
                error!(attempts = attempt, error = %e, "Database connection failed, giving up");
                return Err(ConnectionError::Exhausted {
                    attempts: attempt,
                    source: e,
                });
            },
        }
    }
}
