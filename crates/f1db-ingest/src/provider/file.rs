//! Provider backed by JSON session exports on disk
//!
//! Layout: `<data_dir>/<year>/<event-slug>/<session-slug>.json`, e.g.
//! `data/sessions/2023/monaco/race.json`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ProviderError, SessionData, TelemetryProvider};
use crate::job::IngestJob;

#[derive(Debug, Clone)]
pub struct FileProvider {
    data_dir: PathBuf,
}

impl FileProvider {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Export file expected for `job`
    pub fn session_path(&self, job: &IngestJob) -> PathBuf {
        self.data_dir
            .join(job.year.to_string())
            .join(slug(&job.event))
            .join(format!("{}.json", slug(&job.session_type)))
    }
}

/// Lowercase, whitespace runs collapsed to `_`
fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

#[async_trait]
impl TelemetryProvider for FileProvider {
    async fn load_session(&self, job: &IngestJob) -> Result<SessionData, ProviderError> {
        let path = self.session_path(job);
        debug!(path = %path.display(), "Reading session export");

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProviderError::NotFound(job.clone()));
            },
            Err(source) => return Err(ProviderError::Io { path, source }),
        };

        serde_json::from_slice(&bytes).map_err(|source| ProviderError::Decode {
            job: job.clone(),
            source,
        })
    }
}
