//! Relational row shapes shared by the ingestion pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A session row as written to the `sessions` table.
///
/// `(year, gp_name, session_type, round_number)` is the natural key; the
/// surrogate `session_id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub year: i32,
    pub gp_name: String,
    pub session_type: String,
    pub date: NaiveDate,
    pub round_number: i32,
}

impl std::fmt::Display for NewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} (round {})",
            self.year, self.gp_name, self.session_type, self.round_number
        )
    }
}

/// A normalized lap, one field per `laps` column (minus the owning session).
///
/// Durations are whole milliseconds. `None` is stored as NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapRow {
    pub driver: Option<String>,
    pub lap_number: Option<i32>,
    pub lap_time_ms: Option<i32>,
    pub sector1_time_ms: Option<i32>,
    pub sector2_time_ms: Option<i32>,
    pub sector3_time_ms: Option<i32>,
    pub speed_trap_kmh: Option<i32>,
    pub tyre_compound: Option<String>,
}

/// The per-session uniqueness key of a lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LapKey<'a> {
    pub driver: &'a str,
    pub lap_number: i32,
}

impl LapRow {
    /// Key columns, present only when both are non-NULL.
    pub fn key(&self) -> Option<LapKey<'_>> {
        Some(LapKey {
            driver: self.driver.as_deref()?,
            lap_number: self.lap_number?,
        })
    }

    /// Name of the first key column that is NULL, if any.
    pub fn missing_key_field(&self) -> Option<&'static str> {
        if self.driver.is_none() {
            Some("driver")
        } else if self.lap_number.is_none() {
            Some("lap_number")
        } else {
            None
        }
    }
}
