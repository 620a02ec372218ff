//! Configuration management
//!
//! Read once at process start and passed by reference into the components
//! that need it. Nothing below `main` looks at the environment.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::db::RetryPolicy;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_NAME: &str = "f1_data";
pub const DEFAULT_DB_USER: &str = "postgres";
pub const DEFAULT_DB_PASSWORD: &str = "password";

/// Total connection attempts before a job gives up.
pub const DEFAULT_CONNECT_MAX_ATTEMPTS: u32 = 10;

/// Fixed pause between connection attempts.
pub const DEFAULT_CONNECT_RETRY_DELAY_SECS: u64 = 5;

pub const DEFAULT_PROVIDER_DATA_DIR: &str = "./data/sessions";
pub const DEFAULT_PROVIDER_BASE_URL: &str = "http://localhost:8080";

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub database: DatabaseConfig,
    pub retry: RetryConfig,
    pub provider: ProviderConfig,
    pub row_error_policy: RowErrorPolicy,
}

/// Database connection settings
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection retry settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.delay_secs))
    }
}

/// Where session telemetry comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// JSON exports on the local filesystem
    #[default]
    File,
    /// JSON over HTTP from a telemetry export service
    Http,
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(ProviderKind::File),
            "http" => Ok(ProviderKind::Http),
            other => anyhow::bail!("Invalid provider kind: {} (expected file or http)", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub data_dir: PathBuf,
    pub base_url: String,
}

/// What happens when a single lap cannot be written.
///
/// Applied to every lap of every job in the process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorPolicy {
    /// Roll back the whole job on the first failed lap
    #[default]
    Abort,
    /// Roll back only the failed lap (savepoint), log it and keep going
    Skip,
}

impl std::str::FromStr for RowErrorPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(RowErrorPolicy::Abort),
            "skip" => Ok(RowErrorPolicy::Skip),
            other => anyhow::bail!("Invalid row error policy: {} (expected abort or skip)", other),
        }
    }
}

impl IngestConfig {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_vars(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Build configuration from a variable lookup, falling back to defaults.
    ///
    /// Variables: `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`,
    /// `DB_CONNECT_MAX_ATTEMPTS`, `DB_CONNECT_RETRY_DELAY_SECS`, `PROVIDER_KIND`,
    /// `PROVIDER_DATA_DIR`, `PROVIDER_BASE_URL`, `INGEST_ON_ROW_ERROR`.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        fn parsed<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
        where
            T: std::str::FromStr,
            T::Err: std::fmt::Display,
        {
            match value {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("{}", e))
                    .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
                None => Ok(default),
            }
        }

        Ok(Self {
            database: DatabaseConfig {
                host: string("DB_HOST", DEFAULT_DB_HOST),
                port: parsed(lookup("DB_PORT"), "DB_PORT", DEFAULT_DB_PORT)?,
                name: string("DB_NAME", DEFAULT_DB_NAME),
                user: string("DB_USER", DEFAULT_DB_USER),
                password: string("DB_PASSWORD", DEFAULT_DB_PASSWORD),
            },
            retry: RetryConfig {
                max_attempts: parsed(
                    lookup("DB_CONNECT_MAX_ATTEMPTS"),
                    "DB_CONNECT_MAX_ATTEMPTS",
                    DEFAULT_CONNECT_MAX_ATTEMPTS,
                )?,
                delay_secs: parsed(
                    lookup("DB_CONNECT_RETRY_DELAY_SECS"),
                    "DB_CONNECT_RETRY_DELAY_SECS",
                    DEFAULT_CONNECT_RETRY_DELAY_SECS,
                )?,
            },
            provider: ProviderConfig {
                kind: parsed(lookup("PROVIDER_KIND"), "PROVIDER_KIND", ProviderKind::File)?,
                data_dir: PathBuf::from(string("PROVIDER_DATA_DIR", DEFAULT_PROVIDER_DATA_DIR)),
                base_url: string("PROVIDER_BASE_URL", DEFAULT_PROVIDER_BASE_URL),
            },
            row_error_policy: parsed(
                lookup("INGEST_ON_ROW_ERROR"),
                "INGEST_ON_ROW_ERROR",
                RowErrorPolicy::Abort,
            )?,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.host.trim().is_empty() {
            anyhow::bail!("Database host cannot be empty");
        }

        if self.database.name.trim().is_empty() {
            anyhow::bail!("Database name cannot be empty");
        }

        if self.database.port == 0 {
            anyhow::bail!("Database port must be greater than 0");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("DB_CONNECT_MAX_ATTEMPTS must be at least 1");
        }

        if self.provider.kind == ProviderKind::Http && self.provider.base_url.trim().is_empty() {
            anyhow::bail!("PROVIDER_BASE_URL is required for the http provider");
        }

        Ok(())
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                host: DEFAULT_DB_HOST.to_string(),
                port: DEFAULT_DB_PORT,
                name: DEFAULT_DB_NAME.to_string(),
                user: DEFAULT_DB_USER.to_string(),
                password: DEFAULT_DB_PASSWORD.to_string(),
            },
            retry: RetryConfig {
                max_attempts: DEFAULT_CONNECT_MAX_ATTEMPTS,
                delay_secs: DEFAULT_CONNECT_RETRY_DELAY_SECS,
            },
            provider: ProviderConfig {
                kind: ProviderKind::File,
                data_dir: PathBuf::from(DEFAULT_PROVIDER_DATA_DIR),
                base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            },
            row_error_policy: RowErrorPolicy::Abort,
        }
    }
}
