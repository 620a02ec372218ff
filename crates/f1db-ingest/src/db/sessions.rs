//! Session identity resolution (insert-or-fetch)

use f1db_common::NewSession;
use sqlx::PgConnection;
use tracing::{debug, instrument};

use crate::error::{IngestError, IngestResult};

/// How a session id was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionResolution {
    /// The session row was created by this call
    Inserted(i32),
    /// A row with the same natural key already existed
    Existing(i32),
}

impl SessionResolution {
    pub fn id(self) -> i32 {
        match self {
            SessionResolution::Inserted(id) | SessionResolution::Existing(id) => id,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, SessionResolution::Inserted(_))
    }
}

/// Resolve `session` to its `session_id`, inserting the row if absent.
///
/// The insert returns no row when the natural key already exists; that case
/// is answered by a lookup on the same key. An id that is found by neither
/// path is a [`IngestError::Resolution`].
#[instrument(skip_all, fields(session = %session))]
pub async fn resolve_session(
    conn: &mut PgConnection,
    session: &NewSession,
) -> IngestResult<SessionResolution> {
    let inserted: Option<i32> = sqlx::query_scalar(
        r#"
        INSERT INTO sessions (year, gp_name, session_type, date, round_number)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (year, gp_name, session_type, round_number) DO NOTHING
        RETURNING session_id
        "#,
    )
    .bind(session.year)
    .bind(&session.gp_name)
    .bind(&session.session_type)
    .bind(session.date)
    .bind(session.round_number)
    .fetch_optional(&mut *conn)
    .await
    .map_err(IngestError::SessionQuery)?;

    if let Some(id) = inserted {
        debug!(session_id = id, "Session inserted");
        return Ok(SessionResolution::Inserted(id));
    }

    match find_session_id(conn, session).await? {
        Some(id) => {
            debug!(session_id = id, "Session already exists");
            Ok(SessionResolution::Existing(id))
        },
        None => Err(IngestError::Resolution {
            year: session.year,
            gp_name: session.gp_name.clone(),
            session_type: session.session_type.clone(),
            round_number: session.round_number,
        }),
    }
}

/// Look up the id of the session with the same natural key
pub async fn find_session_id(
    conn: &mut PgConnection,
    session: &NewSession,
) -> IngestResult<Option<i32>> {
    sqlx::query_scalar(
        r#"
        SELECT session_id
        FROM sessions
        WHERE year = $1 AND gp_name = $2 AND session_type = $3 AND round_number = $4
        "#,
    )
    .bind(session.year)
    .bind(&session.gp_name)
    .bind(&session.session_type)
    .bind(session.round_number)
    .fetch_optional(&mut *conn)
    .await
    .map_err(IngestError::SessionQuery)
}
