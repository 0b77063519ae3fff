//! Entry types: the intermediate row every adapter produces and the
//! canonical entry the pipeline writes.
//!
//! An [`IntermediateRow`] is structurally parsed but otherwise raw: worker
//! tokens are unresolved, durations carry no unit unless the source declared
//! one, and dates are in whatever representation the source used. A
//! [`CanonicalEntry`] is fully normalised.

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Error, duration::RawDuration, quality::YieldClass};

// ─── Source category ─────────────────────────────────────────────────────────

/// Which generation of record keeping an entry came from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SourceCategory {
  LegacySpreadsheet,
  CurrentSpreadsheet,
  LiveSystem,
}

impl SourceCategory {
  pub const ALL: [SourceCategory; 3] = [
    SourceCategory::LegacySpreadsheet,
    SourceCategory::CurrentSpreadsheet,
    SourceCategory::LiveSystem,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::LegacySpreadsheet => "legacy-spreadsheet",
      Self::CurrentSpreadsheet => "current-spreadsheet",
      Self::LiveSystem => "live-system",
    }
  }
}

impl fmt::Display for SourceCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SourceCategory {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "legacy-spreadsheet" | "legacy" => Ok(Self::LegacySpreadsheet),
      "current-spreadsheet" | "current" => Ok(Self::CurrentSpreadsheet),
      "live-system" | "live" => Ok(Self::LiveSystem),
      other => Err(Error::UnknownSourceCategory(other.to_string())),
    }
  }
}

// ─── Raw cell values ─────────────────────────────────────────────────────────

/// A cell or column value as the source handed it over.
///
/// Spreadsheet dates and times usually arrive as [`RawValue::Number`]
/// (serial days / fractions of a day); database columns arrive as text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
  #[default]
  Empty,
  Text(String),
  Number(f64),
}

impl RawValue {
  /// Wrap optional text, mapping `None` and blank strings to `Empty`.
  pub fn text(s: Option<impl Into<String>>) -> Self {
    match s.map(Into::into) {
      Some(s) if !s.trim().is_empty() => Self::Text(s),
      _ => Self::Empty,
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      Self::Empty => true,
      Self::Text(s) => s.trim().is_empty(),
      Self::Number(_) => false,
    }
  }

  /// Trimmed, non-empty text. Whole numbers render without a decimal point.
  pub fn as_text(&self) -> Option<String> {
    match self {
      Self::Empty => None,
      Self::Text(s) => {
        let t = s.trim();
        (!t.is_empty()).then(|| t.to_string())
      }
      Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
        Some(format!("{}", *n as i64))
      }
      Self::Number(n) => Some(n.to_string()),
    }
  }

  /// A finite number, parsing text when necessary.
  pub fn as_number(&self) -> Option<f64> {
    match self {
      Self::Empty => None,
      Self::Number(n) => n.is_finite().then_some(*n),
      Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
    }
  }
}

// ─── Intermediate row ────────────────────────────────────────────────────────

/// One extracted source row, before identity resolution and normalisation.
#[derive(Debug, Clone, Default)]
pub struct IntermediateRow {
  /// Sheet row number (1-based) or the live system's source-row id.
  pub ordinal:        u32,
  pub worker:         Option<String>,
  pub date:           RawValue,
  pub start_time:     RawValue,
  pub finish_time:    RawValue,
  pub process_time:   RawDuration,
  pub total_time:     RawDuration,
  pub work_order:     Option<String>,
  pub customer:       Option<String>,
  pub part_name:      Option<String>,
  pub material:       Option<String>,
  pub material_size:  Option<String>,
  pub parts:          RawValue,
  pub yield_value:    RawValue,
  pub rejected_parts: RawValue,
  pub scrap_count:    RawValue,
  pub defect_count:   RawValue,
  pub department:     Option<String>,
  /// Foreign task reference carried by live-system rows.
  pub task_ref:       Option<String>,
  pub notes:          Option<String>,
}

// ─── Canonical entry ─────────────────────────────────────────────────────────

/// One reconciled quality-control observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntry {
  pub source:           SourceCategory,
  pub origin:           String,
  pub ordinal:          u32,
  pub work_order:       Option<String>,
  pub customer:         Option<String>,
  pub entry_date:       NaiveDate,
  /// The resolved identity; for joint entries, the first participant.
  pub identity:         Option<String>,
  /// Every resolved participant, in token order. Empty when unresolved.
  pub participants:     Vec<String>,
  pub worker_token:     Option<String>,
  pub part_name:        Option<String>,
  pub material:         Option<String>,
  pub material_size:    Option<String>,
  pub start_time:       Option<NaiveTime>,
  pub finish_time:      Option<NaiveTime>,
  pub process_minutes:  Option<f64>,
  pub total_minutes:    Option<f64>,
  /// Total minutes when present, otherwise process minutes.
  pub duration_minutes: Option<f64>,
  pub parts_produced:   Option<u32>,
  pub yield_class:      YieldClass,
  pub yield_raw:        Option<String>,
  pub scrap_count:      u32,
  pub defect_count:     u32,
  pub department:       Option<String>,
  pub task_ref:         Option<String>,
  pub notes:            Option<String>,
}

impl CanonicalEntry {
  pub fn is_joint(&self) -> bool { self.participants.len() > 1 }
}

// ─── Validation issues ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
  /// A live-system row references a task but names no operator.
  MissingIdentity,
  UnresolvedIdentity,
  AmbiguousIdentity,
  InvalidPartsCount,
}

impl IssueKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::MissingIdentity => "missing_identity",
      Self::UnresolvedIdentity => "unresolved_identity",
      Self::AmbiguousIdentity => "ambiguous_identity",
      Self::InvalidPartsCount => "invalid_parts_count",
    }
  }
}

impl fmt::Display for IssueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for IssueKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "missing_identity" => Ok(Self::MissingIdentity),
      "unresolved_identity" => Ok(Self::UnresolvedIdentity),
      "ambiguous_identity" => Ok(Self::AmbiguousIdentity),
      "invalid_parts_count" => Ok(Self::InvalidPartsCount),
      other => Err(format!("unknown issue kind: {other:?}")),
    }
  }
}

/// A data-quality finding attached to one source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
  pub ordinal: u32,
  pub kind:    IssueKind,
  pub detail:  String,
}

impl ValidationIssue {
  pub fn new(ordinal: u32, kind: IssueKind, detail: impl Into<String>) -> Self {
    Self { ordinal, kind, detail: detail.into() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn source_category_round_trips_through_str() {
    for c in SourceCategory::ALL {
      assert_eq!(c.as_str().parse::<SourceCategory>().unwrap(), c);
    }
    assert!("spreadsheet".parse::<SourceCategory>().is_err());
  }

  #[test]
  fn whole_numbers_render_without_decimals() {
    assert_eq!(RawValue::Number(12345.0).as_text().as_deref(), Some("12345"));
    assert_eq!(RawValue::Number(7.5).as_text().as_deref(), Some("7.5"));
    assert_eq!(RawValue::Text("  ".into()).as_text(), None);
  }

  #[test]
  fn text_numbers_parse() {
    assert_eq!(RawValue::Text(" 7.5 ".into()).as_number(), Some(7.5));
    assert_eq!(RawValue::Text("n/a".into()).as_number(), None);
    assert!(RawValue::text(Some("")).is_empty());
  }
}
