//! Table provisioning
//!
//! Both statements are create-if-absent, so this runs at the start of every job.

use sqlx::PgConnection;
use tracing::{debug, instrument};

pub const CREATE_SESSIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        session_id   SERIAL PRIMARY KEY,
        year         INTEGER NOT NULL,
        gp_name      VARCHAR(255) NOT NULL,
        session_type VARCHAR(50) NOT NULL,
        date         DATE NOT NULL,
        round_number INTEGER NOT NULL,
        CONSTRAINT uc_session UNIQUE (year, gp_name, session_type, round_number)
    )
"#;

pub const CREATE_LAPS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS laps (
        lap_id          SERIAL PRIMARY KEY,
        session_id      INTEGER NOT NULL REFERENCES sessions (session_id),
        driver          VARCHAR(10) NOT NULL,
        lap_number      INTEGER NOT NULL,
        lap_time_ms     INTEGER,
        sector1_time_ms INTEGER,
        sector2_time_ms INTEGER,
        sector3_time_ms INTEGER,
        speed_trap_kmh  INTEGER,
        tyre_compound   VARCHAR(50),
        CONSTRAINT uc_lap UNIQUE (session_id, driver, lap_number)
    )
"#;

/// Create the `sessions` and `laps` tables with their constraints if missing
#[instrument(skip_all)]
pub async fn ensure_schema(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    debug!("Ensuring database tables exist");

    // laps references sessions, so order matters
    sqlx::query(CREATE_SESSIONS_TABLE).execute(&mut *conn).await?;
    sqlx::query(CREATE_LAPS_TABLE).execute(&mut *conn).await?;

    debug!("Tables checked/created");
    Ok(())
}
