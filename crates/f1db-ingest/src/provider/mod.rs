//! Telemetry provider interface
//!
//! The provider is an external collaborator: given a job it returns the session
//! descriptor and the raw lap records. Values are passed through as the provider
//! produced them, "no data" markers included; [`crate::normalize`] turns them
//! into row values.

pub mod file;
pub mod http;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{ProviderConfig, ProviderKind};
use crate::job::IngestJob;

pub use file::FileProvider;
pub use http::HttpProvider;

/// Session metadata as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Official event name, e.g. "Monaco Grand Prix"
    pub event_name: String,
    pub date: NaiveDate,
    pub round_number: i32,
}

/// A numeric value in whatever form the provider emitted it.
///
/// Floats may be NaN. Strings are kept as emitted: a numeric string such as
/// `"310"` is read as its value during normalization, any other string
/// (`"NaN"`, `"NaT"`, ...) is a "no data" marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Marker(String),
}

/// One lap as emitted by the provider. Durations are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawLap {
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub lap_number: Option<RawNumber>,
    #[serde(default)]
    pub lap_time: Option<RawNumber>,
    #[serde(default)]
    pub sector1_time: Option<RawNumber>,
    #[serde(default)]
    pub sector2_time: Option<RawNumber>,
    #[serde(default)]
    pub sector3_time: Option<RawNumber>,
    #[serde(default)]
    pub speed_trap: Option<RawNumber>,
    #[serde(default)]
    pub compound: Option<String>,
}

/// Everything the provider returns for one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub session: SessionDescriptor,
    #[serde(default)]
    pub laps: Vec<RawLap>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("No telemetry available for {0}")]
    NotFound(IngestJob),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode telemetry for {job}: {source}")]
    Decode {
        job: IngestJob,
        #[source]
        source: serde_json::Error,
    },

    #[error("Telemetry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telemetry service returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid provider URL '{0}'")]
    InvalidUrl(String),
}

/// Source of session telemetry
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    async fn load_session(&self, job: &IngestJob) -> Result<SessionData, ProviderError>;
}

#[async_trait]
impl<T> TelemetryProvider for Box<T>
where
    T: TelemetryProvider + ?Sized,
{
    async fn load_session(&self, job: &IngestJob) -> Result<SessionData, ProviderError> {
        (**self).load_session(job).await
    }
}

/// Build the provider selected by configuration
pub fn from_config(config: &ProviderConfig) -> Result<Box<dyn TelemetryProvider>, ProviderError> {
    Ok(match config.kind {
        ProviderKind::File => Box::new(FileProvider::new(&config.data_dir)),
        ProviderKind::Http => Box::new(HttpProvider::new(&config.base_url)?),
    })
}
