//! Lap normalization
//!
//! Converts provider lap records into [`LapRow`]s. Every conversion is total:
//! a "no data" marker, an absent value, or a value that does not fit the column
//! becomes `None` (stored as NULL). Nothing here touches the store.

use f1db_common::LapRow;

use crate::provider::{RawLap, RawNumber};

/// Marker strings meaning "no data" for text fields (compared case-insensitively)
const TEXT_MARKERS: &[&str] = &["nan", "nat", "none", "null"];

/// Normalize one provider lap into the `laps` row shape
pub fn normalize(raw: &RawLap) -> LapRow {
    LapRow {
        driver: text(raw.driver.as_deref()),
        lap_number: integer(raw.lap_number.as_ref()),
        lap_time_ms: duration_ms(raw.lap_time.as_ref()),
        sector1_time_ms: duration_ms(raw.sector1_time.as_ref()),
        sector2_time_ms: duration_ms(raw.sector2_time.as_ref()),
        sector3_time_ms: duration_ms(raw.sector3_time.as_ref()),
        speed_trap_kmh: integer(raw.speed_trap.as_ref()),
        tyre_compound: text(raw.compound.as_deref()),
    }
}

/// Tolerance (in ms) within which a float is taken to be an exact millisecond
const MS_EPSILON: f64 = 1e-6;

/// A provider number that carries a value
#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Int(i64),
    Float(f64),
}

/// Finite numbers and numeric strings (`"310"`, `"20.5"`); everything else is
/// a marker
fn numeric(value: Option<&RawNumber>) -> Option<Numeric> {
    match value? {
        RawNumber::Int(v) => Some(Numeric::Int(*v)),
        RawNumber::Float(v) if v.is_finite() => Some(Numeric::Float(*v)),
        RawNumber::Float(_) => None,
        RawNumber::Marker(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(v) => Some(Numeric::Int(v)),
                Err(_) => s.parse::<f64>().ok().filter(|v| v.is_finite()).map(Numeric::Float),
            }
        },
    }
}

/// Seconds to whole milliseconds, fractional remainder truncated.
///
/// A product within [`MS_EPSILON`] of a whole millisecond is snapped to it, so
/// binary float error (`1.005 * 1000 = 1004.999…`) does not cost a millisecond.
pub fn duration_ms(value: Option<&RawNumber>) -> Option<i32> {
    match numeric(value)? {
        Numeric::Int(secs) => i32::try_from(secs.checked_mul(1000)?).ok(),
        Numeric::Float(secs) => {
            let ms = secs * 1000.0;
            let nearest = ms.round();
            let ms = if (ms - nearest).abs() < MS_EPSILON {
                nearest
            } else {
                ms.trunc()
            };
            to_i32(ms)
        },
    }
}

/// Any provider numeric kind to a plain integer; floats truncate toward zero.
pub fn integer(value: Option<&RawNumber>) -> Option<i32> {
    match numeric(value)? {
        Numeric::Int(v) => i32::try_from(v).ok(),
        Numeric::Float(v) => to_i32(v.trunc()),
    }
}

/// An integral float to `i32`, `None` outside the column range
fn to_i32(v: f64) -> Option<i32> {
    if v < f64::from(i32::MIN) || v > f64::from(i32::MAX) {
        None
    } else {
        Some(v as i32)
    }
}

/// Text stored verbatim unless it is absent or a marker
pub fn text(value: Option<&str>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || TEXT_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m)) {
        None
    } else {
        Some(value.to_string())
    }
}
