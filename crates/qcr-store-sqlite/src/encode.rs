//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are `YYYY-MM-DD`, times of day `HH:MM:SS`, timestamps RFC 3339.
//! Lists (participants, certified departments) are compact JSON arrays.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use qcr_core::{
  entry::{CanonicalEntry, IssueKind, SourceCategory, ValidationIssue},
  identity::CanonicalIdentity,
  quality::YieldClass,
  store::{OriginRecord, OriginStatus, StoredIssue},
};

use crate::{Error, Result};

// ─── Dates and times ─────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn decode_source(s: &str) -> Result<SourceCategory> { Ok(s.parse()?) }

pub fn decode_yield(s: &str) -> Result<YieldClass> { Ok(s.parse()?) }

pub fn decode_issue_kind(s: &str) -> Result<IssueKind> {
  s.parse()
    .map_err(|_| Error::Decode { column: "kind", value: s.to_string() })
}

pub fn decode_status(status: &str, error: Option<String>) -> Result<OriginStatus> {
  match status {
    "success" => Ok(OriginStatus::Success),
    "failed" => Ok(OriginStatus::Failed(error.unwrap_or_default())),
    other => Err(Error::Decode { column: "status", value: other.to_string() }),
  }
}

// ─── Lists ───────────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` that feeds [`RawEntry::from_row`].
pub const ENTRY_COLUMNS: &str = "source, origin, ordinal, work_order, customer, \
  entry_date, identity, participants, worker_token, part_name, material, \
  material_size, start_time, finish_time, process_minutes, total_minutes, \
  duration_minutes, parts_produced, yield_class, yield_raw, scrap_count, \
  defect_count, department, task_ref, notes";

/// An `entries` row as SQLite hands it back.
pub struct RawEntry {
  pub source:           String,
  pub origin:           String,
  pub ordinal:          u32,
  pub work_order:       Option<String>,
  pub customer:         Option<String>,
  pub entry_date:       String,
  pub identity:         Option<String>,
  pub participants:     String,
  pub worker_token:     Option<String>,
  pub part_name:        Option<String>,
  pub material:         Option<String>,
  pub material_size:    Option<String>,
  pub start_time:       Option<String>,
  pub finish_time:      Option<String>,
  pub process_minutes:  Option<f64>,
  pub total_minutes:    Option<f64>,
  pub duration_minutes: Option<f64>,
  pub parts_produced:   Option<u32>,
  pub yield_class:      String,
  pub yield_raw:        Option<String>,
  pub scrap_count:      u32,
  pub defect_count:     u32,
  pub department:       Option<String>,
  pub task_ref:         Option<String>,
  pub notes:            Option<String>,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      source:           row.get(0)?,
      origin:           row.get(1)?,
      ordinal:          row.get(2)?,
      work_order:       row.get(3)?,
      customer:         row.get(4)?,
      entry_date:       row.get(5)?,
      identity:         row.get(6)?,
      participants:     row.get(7)?,
      worker_token:     row.get(8)?,
      part_name:        row.get(9)?,
      material:         row.get(10)?,
      material_size:    row.get(11)?,
      start_time:       row.get(12)?,
      finish_time:      row.get(13)?,
      process_minutes:  row.get(14)?,
      total_minutes:    row.get(15)?,
      duration_minutes: row.get(16)?,
      parts_produced:   row.get(17)?,
      yield_class:      row.get(18)?,
      yield_raw:        row.get(19)?,
      scrap_count:      row.get(20)?,
      defect_count:     row.get(21)?,
      department:       row.get(22)?,
      task_ref:         row.get(23)?,
      notes:            row.get(24)?,
    })
  }

  pub fn into_entry(self) -> Result<CanonicalEntry> {
    Ok(CanonicalEntry {
      source:           decode_source(&self.source)?,
      origin:           self.origin,
      ordinal:          self.ordinal,
      work_order:       self.work_order,
      customer:         self.customer,
      entry_date:       decode_date(&self.entry_date)?,
      identity:         self.identity,
      participants:     decode_list(&self.participants)?,
      worker_token:     self.worker_token,
      part_name:        self.part_name,
      material:         self.material,
      material_size:    self.material_size,
      start_time:       self.start_time.as_deref().map(decode_time).transpose()?,
      finish_time:      self.finish_time.as_deref().map(decode_time).transpose()?,
      process_minutes:  self.process_minutes,
      total_minutes:    self.total_minutes,
      duration_minutes: self.duration_minutes,
      parts_produced:   self.parts_produced,
      yield_class:      decode_yield(&self.yield_class)?,
      yield_raw:        self.yield_raw,
      scrap_count:      self.scrap_count,
      defect_count:     self.defect_count,
      department:       self.department,
      task_ref:         self.task_ref,
      notes:            self.notes,
    })
  }
}

pub struct RawOrigin {
  pub source:        String,
  pub origin:        String,
  pub location:      Option<String>,
  pub rows_written:  i64,
  pub rows_dropped:  i64,
  pub rows_skipped:  i64,
  pub unresolved:    i64,
  pub imported_at:   String,
  pub status:        String,
  pub error_message: Option<String>,
}

impl RawOrigin {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      source:        row.get(0)?,
      origin:        row.get(1)?,
      location:      row.get(2)?,
      rows_written:  row.get(3)?,
      rows_dropped:  row.get(4)?,
      rows_skipped:  row.get(5)?,
      unresolved:    row.get(6)?,
      imported_at:   row.get(7)?,
      status:        row.get(8)?,
      error_message: row.get(9)?,
    })
  }

  pub fn into_origin(self) -> Result<OriginRecord> {
    Ok(OriginRecord {
      source:       decode_source(&self.source)?,
      origin:       self.origin,
      location:     self.location,
      rows_written: self.rows_written.max(0) as usize,
      rows_dropped: self.rows_dropped.max(0) as usize,
      rows_skipped: self.rows_skipped.max(0) as usize,
      unresolved:   self.unresolved.max(0) as usize,
      imported_at:  decode_dt(&self.imported_at)?,
      status:       decode_status(&self.status, self.error_message)?,
    })
  }
}

pub struct RawIssue {
  pub source:  String,
  pub origin:  String,
  pub ordinal: u32,
  pub kind:    String,
  pub detail:  String,
}

impl RawIssue {
  pub fn into_issue(self) -> Result<StoredIssue> {
    Ok(StoredIssue {
      source: decode_source(&self.source)?,
      origin: self.origin,
      issue:  ValidationIssue {
        ordinal: self.ordinal,
        kind:    decode_issue_kind(&self.kind)?,
        detail:  self.detail,
      },
    })
  }
}

pub struct RawIdentity {
  pub name:                  String,
  pub role:                  Option<String>,
  pub primary_department:    Option<String>,
  pub certified_departments: String,
}

impl RawIdentity {
  pub fn into_identity(self) -> Result<CanonicalIdentity> {
    Ok(CanonicalIdentity {
      name:                  self.name,
      role:                  self.role,
      primary_department:    self.primary_department,
      certified_departments: decode_list(&self.certified_departments)?,
    })
  }
}
