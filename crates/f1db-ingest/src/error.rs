//! Ingestion error types

use thiserror::Error;

use crate::provider::ProviderError;

/// Result type alias for ingestion operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// The store stayed unreachable for every connection attempt
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Could not connect to the database after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
}

/// A single lap could not be written
#[derive(Error, Debug)]
pub enum RowWriteError {
    #[error("Lap #{index} has no {field}; it cannot be keyed")]
    MissingKey { index: usize, field: &'static str },

    #[error("Failed to write lap {lap_number} for driver {driver}: {source}")]
    Store {
        driver: String,
        lap_number: i32,
        #[source]
        source: sqlx::Error,
    },
}

/// Failure of one ingestion job. Every variant leaves nothing committed,
/// except `RowWrite` under the skip policy, which is never surfaced here.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Failed to ensure database schema: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("Telemetry provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error(
        "Session {year} {gp_name} {session_type} (round {round_number}) was neither inserted nor found"
    )]
    Resolution {
        year: i32,
        gp_name: String,
        session_type: String,
        round_number: i32,
    },

    #[error("Session lookup failed: {0}")]
    SessionQuery(#[source] sqlx::Error),

    #[error(transparent)]
    RowWrite(#[from] RowWriteError),

    #[error("Transaction error: {0}")]
    Transaction(#[source] sqlx::Error),
}

impl IngestError {
    /// Short category name used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Connection(_) => "connection",
            IngestError::Schema(_) => "schema",
            IngestError::Provider(_) => "provider",
            IngestError::Resolution { .. } | IngestError::SessionQuery(_) => "resolution",
            IngestError::RowWrite(_) => "row_write",
            IngestError::Transaction(_) => "transaction",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_message() {
        let err = IngestError::from(ConnectionError::Exhausted {
            attempts: 3,
            source: sqlx::Error::PoolTimedOut,
        });
        assert_eq!(err.kind(), "connection");
        assert!(err.to_string().contains("after 3 attempt(s)"));
    }

    #[test]
    fn test_resolution_error_message() {
        let err = IngestError::Resolution {
            year: 2023,
            gp_name: "Monaco Grand Prix".to_string(),
            session_type: "Race".to_string(),
            round_number: 6,
        };
        assert_eq!(err.kind(), "resolution");
        assert_eq!(
            err.to_string(),
            "Session 2023 Monaco Grand Prix Race (round 6) was neither inserted nor found"
        );
    }

    #[test]
    fn test_row_write_missing_key_message() {
        let err = IngestError::from(RowWriteError::MissingKey {
            index: 4,
            field: "driver",
        });
        assert_eq!(err.kind(), "row_write");
        assert_eq!(err.to_string(), "Lap #4 has no driver; it cannot be keyed");
    }
}
