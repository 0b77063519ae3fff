//! Duration normalisation.
//!
//! Shop-floor sheets record durations as bare numbers with no unit: `7.5`
//! usually means hours, `450` usually means minutes. [`normalize_to_minutes`]
//! is a heuristic that infers which. Boundary values are load-bearing; change
//! them only alongside the tests below.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::entry::RawValue;

/// Minute values that commonly appear verbatim on sheets: every half hour
/// from 30 to 510 (8.5 hours).
pub const ROUND_MINUTE_VALUES: [u32; 17] = [
  30, 60, 90, 120, 150, 180, 210, 240, 270, 300, 330, 360, 390, 420, 450, 480,
  510,
];

/// Values at or below this are read as hours.
pub const HOURS_CEILING: f64 = 8.0;
/// Values above this are read as minutes.
pub const MINUTES_FLOOR: f64 = 24.0;

/// Infer whether `raw` is hours or minutes and return minutes.
///
/// - non-finite or `<= 0` is `None`
/// - `> 24` is already minutes
/// - `<= 8` is hours
/// - in `(8, 24]`: a round minute value stays as-is, everything else is
///   treated as hours
///
/// The `(8, 24]` band can never contain a round minute value (the smallest
/// is 30), so in practice the whole band is read as hours.
pub fn normalize_to_minutes(raw: f64) -> Option<f64> {
  if !raw.is_finite() || raw <= 0.0 {
    return None;
  }
  if raw > MINUTES_FLOOR {
    return Some(raw);
  }
  if raw <= HOURS_CEILING {
    return Some(raw * 60.0);
  }
  if is_round_minute_value(raw) {
    return Some(raw);
  }
  Some(raw * 60.0)
}

fn is_round_minute_value(raw: f64) -> bool {
  raw.fract() == 0.0 && ROUND_MINUTE_VALUES.contains(&(raw as u32))
}

// ─── Tagged durations ────────────────────────────────────────────────────────

/// A unit declared by the source itself, e.g. a `process_time_minutes` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
  Hours,
  Minutes,
}

/// A duration value plus the unit the source declared, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDuration {
  pub value: RawValue,
  pub unit:  Option<DurationUnit>,
}

impl RawDuration {
  pub fn untagged(value: RawValue) -> Self { Self { value, unit: None } }

  pub fn minutes(value: RawValue) -> Self {
    Self { value, unit: Some(DurationUnit::Minutes) }
  }

  /// Minutes for this duration. Untagged values go through the heuristic;
  /// tagged values are converted directly.
  pub fn to_minutes(&self) -> Option<f64> {
    let n = self.value.as_number()?;
    match self.unit {
      None => normalize_to_minutes(n),
      Some(_) if !n.is_finite() || n <= 0.0 => None,
      Some(DurationUnit::Minutes) => Some(n),
      Some(DurationUnit::Hours) => Some(n * 60.0),
    }
  }
}

/// Whole-minute span between two timestamps, `None` unless `stop > start`.
pub fn minutes_between(start: NaiveDateTime, stop: NaiveDateTime) -> Option<f64> {
  let secs = (stop - start).num_seconds();
  (secs > 0).then(|| secs as f64 / 60.0)
}

/// Minutes between two times of day on the same shift. A finish earlier than
/// the start is taken to cross midnight.
pub fn minutes_between_times(start: NaiveTime, finish: NaiveTime) -> Option<f64> {
  let mut secs = (finish - start).num_seconds();
  if secs < 0 {
    secs += 24 * 60 * 60;
  }
  (secs > 0).then(|| secs as f64 / 60.0)
}
