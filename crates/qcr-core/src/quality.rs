//! Yield classification and count parsing.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, entry::RawValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldClass {
  #[default]
  Ok,
  Scrap,
  Defect,
  Other,
}

impl YieldClass {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Ok => "ok",
      Self::Scrap => "scrap",
      Self::Defect => "defect",
      Self::Other => "other",
    }
  }
}

impl fmt::Display for YieldClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for YieldClass {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ok" => Ok(Self::Ok),
      "scrap" => Ok(Self::Scrap),
      "defect" => Ok(Self::Defect),
      "other" => Ok(Self::Other),
      other => Err(Error::UnknownYieldClass(other.to_string())),
    }
  }
}

/// The outcome of reading a row's yield columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YieldReading {
  pub class:        YieldClass,
  pub scrap_count:  u32,
  pub defect_count: u32,
  /// The yield cell as written, for audit.
  pub raw:          Option<String>,
}

/// Classify a yield cell plus any explicit reject/scrap/defect counts.
///
/// Text containing `SCRAP` is scrap, `DEFECT` or `BAD` is a defect; the first
/// number in the text is the count, defaulting to 1. Blank cells, numbers and
/// `OK`/`GOOD`/`PASS` are ok. Anything else is `other`. Explicit counts from
/// dedicated columns win over counts read from the text, and a positive count
/// upgrades an otherwise-ok row.
pub fn read_yield(
  yield_value: &RawValue,
  rejected: &RawValue,
  scrap: &RawValue,
  defects: &RawValue,
) -> YieldReading {
  let raw = yield_value.as_text();
  let mut reading = YieldReading {
    class: YieldClass::Ok,
    scrap_count: 0,
    defect_count: 0,
    raw: raw.clone(),
  };

  if let (Some(text), RawValue::Text(_)) = (raw.as_deref(), yield_value) {
    let upper = text.to_uppercase();
    if upper.contains("SCRAP") {
      reading.class = YieldClass::Scrap;
      reading.scrap_count = first_number(&upper).unwrap_or(1);
    } else if upper.contains("DEFECT") || upper.contains("BAD") {
      reading.class = YieldClass::Defect;
      reading.defect_count = first_number(&upper).unwrap_or(1);
    } else if !is_ok_word(&upper) && upper.trim().parse::<f64>().is_err() {
      reading.class = YieldClass::Other;
    }
  }

  if let Some(Ok(n)) = parse_count(scrap) {
    reading.scrap_count = n;
  }
  let explicit_defects = match (parse_count(defects), parse_count(rejected)) {
    (Some(Ok(n)), _) | (None, Some(Ok(n))) => Some(n),
    _ => None,
  };
  if let Some(n) = explicit_defects {
    reading.defect_count = n;
  }

  if reading.class == YieldClass::Ok {
    if reading.scrap_count > 0 {
      reading.class = YieldClass::Scrap;
    } else if reading.defect_count > 0 {
      reading.class = YieldClass::Defect;
    }
  }
  reading
}

fn is_ok_word(upper: &str) -> bool {
  matches!(upper.trim(), "OK" | "GOOD" | "PASS" | "PASSED")
}

fn first_number(text: &str) -> Option<u32> {
  let start = text.find(|c: char| c.is_ascii_digit())?;
  let digits: String =
    text[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
  digits.parse().ok()
}

/// Why a count cell was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum CountError {
  Negative(f64),
  NotANumber(String),
}

impl fmt::Display for CountError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Negative(n) => write!(f, "negative count {n}"),
      Self::NotANumber(s) => write!(f, "not a number: {s:?}"),
    }
  }
}

/// Parse a non-negative count. Fractional values are truncated.
///
/// `None` for a blank cell.
pub fn parse_count(value: &RawValue) -> Option<Result<u32, CountError>> {
  if value.is_empty() {
    return None;
  }
  let Some(n) = value.as_number() else {
    return Some(Err(CountError::NotANumber(
      value.as_text().unwrap_or_default(),
    )));
  };
  if n < 0.0 {
    return Some(Err(CountError::Negative(n)));
  }
  Some(Ok(n.trunc().min(u32::MAX as f64) as u32))
}
