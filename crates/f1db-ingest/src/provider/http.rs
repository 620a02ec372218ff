//! Provider backed by a telemetry export service
//!
//! `GET <base_url>/sessions/<year>/<event>/<session_type>` returns the same JSON
//! document the file provider reads from disk.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::debug;

use super::{ProviderError, SessionData, TelemetryProvider};
use crate::job::IngestJob;

#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpProvider {
    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        let base_url = Url::parse(base_url).map_err(|_| ProviderError::InvalidUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    /// Request URL for `job`, with each segment percent-encoded
    pub fn session_url(&self, job: &IngestJob) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("sessions")
            .push(&job.year.to_string())
            .push(&job.event)
            .push(&job.session_type);
        Ok(url)
    }
}

#[async_trait]
impl TelemetryProvider for HttpProvider {
    async fn load_session(&self, job: &IngestJob) -> Result<SessionData, ProviderError> {
        let url = self.session_url(job)?;
        debug!(url = %url, "Requesting session telemetry");

        let response = self.client.get(url.clone()).send().await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.bytes().await?;
                serde_json::from_slice(&body).map_err(|source| ProviderError::Decode {
                    job: job.clone(),
                    source,
                })
            },
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound(job.clone())),
            status => Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}
