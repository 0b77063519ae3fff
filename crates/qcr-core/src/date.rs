//! Date and time-of-day parsing.
//!
//! Spreadsheet dates arrive as serial day numbers or free text; live-system
//! dates arrive as ISO text or epoch seconds. [`parse_raw_date`] handles the
//! representation; [`DateWindow`] decides whether the result is plausible.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::entry::RawValue;

/// Text formats tried, in order, after ISO-8601.
const DATE_FORMATS: &[&str] =
  &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &[
  "%H:%M:%S",
  "%H:%M",
  "%I:%M %p",
  "%I:%M:%S %p",
  "%I:%M%p",
  "%H:%M:%S%.f",
];

/// Numbers above this are epoch seconds rather than serial days.
const EPOCH_SECONDS_FLOOR: f64 = 1e9;
/// Numbers above this are epoch milliseconds.
const EPOCH_MILLIS_FLOOR: f64 = 1e12;

// ─── Window ──────────────────────────────────────────────────────────────────

/// The inclusive range of plausible calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateWindow {
  pub min_year: i32,
  pub max_year: i32,
}

impl Default for DateWindow {
  fn default() -> Self { Self { min_year: 2000, max_year: 2100 } }
}

impl DateWindow {
  pub fn contains(&self, date: NaiveDate) -> bool {
    use chrono::Datelike;
    (self.min_year..=self.max_year).contains(&date.year())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOutcome {
  Valid(NaiveDate),
  OutOfWindow(NaiveDate),
  Unparseable,
}

/// Parse `raw` and check it against `window`.
pub fn normalize_date(raw: &RawValue, window: &DateWindow) -> DateOutcome {
  match parse_raw_date(raw) {
    Some(d) if window.contains(d) => DateOutcome::Valid(d),
    Some(d) => DateOutcome::OutOfWindow(d),
    None => DateOutcome::Unparseable,
  }
}

// ─── Representations ─────────────────────────────────────────────────────────

/// Interpret a cell as a calendar date without any plausibility check.
pub fn parse_raw_date(raw: &RawValue) -> Option<NaiveDate> {
  match raw {
    RawValue::Empty => None,
    RawValue::Number(n) => date_from_number(*n),
    RawValue::Text(s) => parse_date_text(s),
  }
}

fn date_from_number(n: f64) -> Option<NaiveDate> {
  if !n.is_finite() {
    return None;
  }
  if n > EPOCH_MILLIS_FLOOR {
    return DateTime::from_timestamp_millis(n as i64).map(|t| t.date_naive());
  }
  if n > EPOCH_SECONDS_FLOOR {
    return DateTime::from_timestamp(n as i64, 0).map(|t| t.date_naive());
  }
  date_from_serial(n)
}

/// Convert a spreadsheet serial day number (1900 date system).
///
/// Serial 60 is the fictitious 1900-02-29, so serials below it are shifted
/// forward a day to line up with the calendar.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
  if !serial.is_finite() || serial.abs() > 3_000_000.0 {
    return None;
  }
  let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
  let mut days = serial.floor() as i64;
  if serial > 0.0 && serial < 60.0 {
    days += 1;
  }
  epoch.checked_add_signed(Duration::days(days))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok(n) = s.parse::<f64>() {
    return date_from_number(n);
  }
  if let Ok(t) = DateTime::parse_from_rfc3339(s) {
    return Some(t.date_naive());
  }
  if let Some(t) = parse_datetime_text(s) {
    return Some(t.date());
  }
  let token = s.split_whitespace().next()?;
  DATE_FORMATS
    .iter()
    .find_map(|f| NaiveDate::parse_from_str(token, f).ok())
}

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
  DATETIME_FORMATS
    .iter()
    .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

/// Parse a full timestamp: ISO-8601 text, `YYYY-MM-DD HH:MM[:SS]`, or epoch
/// seconds/milliseconds.
pub fn parse_timestamp(raw: &RawValue) -> Option<NaiveDateTime> {
  match raw {
    RawValue::Empty => None,
    RawValue::Number(n) => timestamp_from_number(*n),
    RawValue::Text(s) => {
      let s = s.trim();
      if let Ok(n) = s.parse::<f64>() {
        return timestamp_from_number(n);
      }
      if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.naive_utc());
      }
      parse_datetime_text(s)
    }
  }
}

fn timestamp_from_number(n: f64) -> Option<NaiveDateTime> {
  if n > EPOCH_MILLIS_FLOOR {
    DateTime::from_timestamp_millis(n as i64).map(|t| t.naive_utc())
  } else if n > EPOCH_SECONDS_FLOOR {
    DateTime::from_timestamp(n as i64, 0).map(|t| t.naive_utc())
  } else {
    None
  }
}

/// Interpret a cell as a time of day.
///
/// Numbers are fractions of a day; any whole-day part (a full date-time
/// serial) is discarded.
pub fn parse_time_of_day(raw: &RawValue) -> Option<NaiveTime> {
  match raw {
    RawValue::Empty => None,
    RawValue::Number(n) => time_from_fraction(*n),
    RawValue::Text(s) => {
      let s = s.trim();
      if let Ok(n) = s.parse::<f64>() {
        return time_from_fraction(n);
      }
      if let Some(t) = TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(s, f).ok())
      {
        return Some(t);
      }
      parse_timestamp(raw).map(|t| t.time())
    }
  }
}

fn time_from_fraction(n: f64) -> Option<NaiveTime> {
  if !n.is_finite() || n < 0.0 {
    return None;
  }
  let secs = (n.fract() * 86_400.0).round() as u32;
  NaiveTime::from_num_seconds_from_midnight_opt(secs.min(86_399), 0)
}
