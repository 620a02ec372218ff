//! Ingestion job identity: one `(year, event, session type)` tuple

use serde::{Deserialize, Serialize};

/// Jobs ingested when none are given on the command line
pub const DEFAULT_JOBS: &[(i32, &str, &str)] = &[(2023, "Monaco", "Race"), (2023, "Bahrain", "Race")];

/// A single session to ingest, as requested by the caller.
///
/// `event` is the caller's event name (e.g. "Monaco"); the provider resolves
/// it to the official event name stored on the session row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngestJob {
    pub year: i32,
    pub event: String,
    pub session_type: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JobParseError {
    #[error("Expected YEAR:EVENT:SESSION_TYPE, got '{0}'")]
    Format(String),
    #[error("Invalid year '{0}'")]
    Year(String),
    #[error("Event and session type must not be empty in '{0}'")]
    Empty(String),
}

impl IngestJob {
    pub fn new(year: i32, event: impl Into<String>, session_type: impl Into<String>) -> Self {
        Self {
            year,
            event: event.into(),
            session_type: session_type.into(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        DEFAULT_JOBS
            .iter()
            .map(|(year, event, session_type)| Self::new(*year, *event, *session_type))
            .collect()
    }
}

impl std::fmt::Display for IngestJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.year, self.event, self.session_type)
    }
}

impl std::str::FromStr for IngestJob {
    type Err = JobParseError;

    /// Parses `YEAR:EVENT:SESSION_TYPE`, e.g. `2023:Monaco:Race`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(year), Some(event), Some(session_type)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(JobParseError::Format(s.to_string()));
        };

        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| JobParseError::Year(year.to_string()))?;

        let (event, session_type) = (event.trim(), session_type.trim());
        if event.is_empty() || session_type.is_empty() {
            return Err(JobParseError::Empty(s.to_string()));
        }

        Ok(Self::new(year, event, session_type))
    }
}
