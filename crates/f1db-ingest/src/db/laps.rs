//! Lap upserts keyed by `(session_id, driver, lap_number)`

use f1db_common::LapRow;
use sqlx::PgConnection;

use crate::error::RowWriteError;

/// Whether an upsert created a row or overwrote an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapWrite {
    Inserted,
    Updated,
}

/// Write one lap for `session_id`.
///
/// An existing row with the same key has all measured columns replaced by the
/// new values, NULLs included, so the most recent ingestion wins. `index` is
/// the lap's position in the provider output and only feeds error messages.
pub async fn upsert_lap(
    conn: &mut PgConnection,
    session_id: i32,
    lap: &LapRow,
    index: usize,
) -> Result<LapWrite, RowWriteError> {
    let key = lap.key().ok_or(RowWriteError::MissingKey {
        index,
        field: lap.missing_key_field().unwrap_or("driver"),
    })?;

    // xmax is zero only for a tuple created by this statement
    let inserted: bool = sqlx::query_scalar(
        r#"
        INSERT INTO laps (
            session_id, driver, lap_number,
            lap_time_ms, sector1_time_ms, sector2_time_ms, sector3_time_ms,
            speed_trap_kmh, tyre_compound
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (session_id, driver, lap_number) DO UPDATE SET
            lap_time_ms = EXCLUDED.lap_time_ms,
            sector1_time_ms = EXCLUDED.sector1_time_ms,
            sector2_time_ms = EXCLUDED.sector2_time_ms,
            sector3_time_ms = EXCLUDED.sector3_time_ms,
            speed_trap_kmh = EXCLUDED.speed_trap_kmh,
            tyre_compound = EXCLUDED.tyre_compound
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(session_id)
    .bind(key.driver)
    .bind(key.lap_number)
    .bind(lap.lap_time_ms)
    .bind(lap.sector1_time_ms)
    .bind(lap.sector2_time_ms)
    .bind(lap.sector3_time_ms)
    .bind(lap.speed_trap_kmh)
    .bind(lap.tyre_compound.as_deref())
    .fetch_one(&mut *conn)
    .await
    .map_err(|source| RowWriteError::Store {
        driver: key.driver.to_string(),
        lap_number: key.lap_number,
        source,
    })?;

    Ok(if inserted {
        LapWrite::Inserted
    } else {
        LapWrite::Updated
    })
}
