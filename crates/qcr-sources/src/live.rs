//! The live operational database.
//!
//! One SQLite file is one origin. Rows come from a single table (by default
//! `qc_entries`), restricted to directly-entered rows when the table carries a
//! `data_source` column. Columns the table lacks read as blank. Duration
//! columns are named `*_minutes` and are taken at their word.

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use qcr_core::{
  date::{parse_raw_date, parse_timestamp},
  duration::{RawDuration, minutes_between},
  entry::{IntermediateRow, IssueKind, RawValue, SourceCategory, ValidationIssue},
};
use rusqlite::{Connection, OpenFlags, params, types::Value};
use tracing::{debug, info};

use crate::{
  Error, Result,
  adapter::{Extraction, Origin, SourceAdapter},
};

pub const DEFAULT_LIVE_TABLE: &str = "qc_entries";

/// Only rows with this `data_source` are read.
const DIRECT_INPUT: &str = "direct_input";

/// Source columns in the order they are selected.
const COLUMNS: &[&str] = &[
  "entry_date",
  "operator",
  "department",
  "work_order",
  "customer_name",
  "part_name",
  "start_timestamp",
  "stop_timestamp",
  "process_time_minutes",
  "total_time_minutes",
  "parts_produced",
  "total_parts",
  "defects_count",
  "scrap_count",
  "yield_status",
  "material",
  "material_size",
  "notes",
  "asana_task_gid",
];

#[derive(Debug, Clone)]
pub struct LiveSystemAdapter {
  path:  PathBuf,
  table: String,
}

impl LiveSystemAdapter {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), table: DEFAULT_LIVE_TABLE.to_string() }
  }

  pub fn with_table(mut self, table: impl Into<String>) -> Self {
    self.table = table.into();
    self
  }
}

fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn open_read_only(path: &Path) -> Result<Connection> {
  Ok(Connection::open_with_flags(
    path,
    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
  )?)
}

fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
  let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
  let names = stmt
    .query_map(params![table], |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<HashSet<_>>>()?;
  Ok(names)
}

fn raw_value(v: Value) -> RawValue {
  match v {
    Value::Null | Value::Blob(_) => RawValue::Empty,
    Value::Integer(n) => RawValue::Number(n as f64),
    Value::Real(n) => RawValue::Number(n),
    Value::Text(s) => RawValue::text(Some(s)),
  }
}

/// Build the `SELECT` for the columns `table` actually has.
fn select_sql(table: &str, present: &HashSet<String>) -> String {
  let id = if present.contains("id") { "id" } else { "rowid" };
  let fields: Vec<&str> = COLUMNS
    .iter()
    .map(|c| if present.contains(*c) { *c } else { "NULL" })
    .collect();
  let mut sql = format!("SELECT {id}, {} FROM \"{table}\"", fields.join(", "));
  if present.contains("data_source") {
    sql.push_str(&format!(" WHERE data_source = '{DIRECT_INPUT}'"));
  }
  sql.push_str(&format!(" ORDER BY {id}"));
  sql
}

impl SourceAdapter for LiveSystemAdapter {
  fn category(&self) -> SourceCategory { SourceCategory::LiveSystem }

  fn discover(&self) -> Result<Vec<Origin>> {
    if !self.path.is_file() {
      return Err(Error::MissingDatabase(self.path.clone()));
    }
    let reference = self
      .path
      .file_name()
      .and_then(|n| n.to_str())
      .unwrap_or(DEFAULT_LIVE_TABLE)
      .to_string();
    Ok(vec![Origin { reference, location: self.path.clone() }])
  }

  fn extract(&self, origin: &Origin) -> Result<Extraction> {
    if !is_identifier(&self.table) {
      return Err(Error::InvalidTableName(self.table.clone()));
    }
    let conn = open_read_only(&origin.location)?;
    let present = table_columns(&conn, &self.table)?;
    if present.is_empty() {
      return Err(Error::MissingTable(self.table.clone()));
    }

    let mut stmt = conn.prepare(&select_sql(&self.table, &present))?;
    let records = stmt
      .query_map([], |row| {
        let id: i64 = row.get(0)?;
        let values = (1..=COLUMNS.len())
          .map(|i| row.get::<_, Value>(i).map(raw_value))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((id, values))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut out = Extraction::default();
    for (id, values) in records {
      match live_row(id, values) {
        Some(row) => {
          if row.worker.is_none() && row.task_ref.is_some() {
            out.issues.push(ValidationIssue::new(
              row.ordinal,
              IssueKind::MissingIdentity,
              format!(
                "task {} has no operator",
                row.task_ref.as_deref().unwrap_or_default()
              ),
            ));
          }
          out.rows.push(row);
        }
        None => {
          debug!(id, "dropping live row without a readable date");
          out.dropped += 1;
        }
      }
    }
    info!(
      origin = %origin.reference,
      table = %self.table,
      rows = out.rows.len(),
      dropped = out.dropped,
      "read live system"
    );
    Ok(out)
  }
}

/// Map one selected record onto an intermediate row. `None` when the row has
/// no readable date or an id that cannot serve as an ordinal.
fn live_row(id: i64, values: Vec<RawValue>) -> Option<IntermediateRow> {
  let ordinal = u32::try_from(id).ok()?;
  let [
    entry_date,
    operator,
    department,
    work_order,
    customer,
    part_name,
    start,
    stop,
    process,
    total,
    parts_produced,
    total_parts,
    defects,
    scrap,
    yield_status,
    material,
    material_size,
    notes,
    task,
  ]: [RawValue; 19] = values.try_into().ok()?;

  parse_raw_date(&entry_date)?;

  let mut total_time = RawDuration::minutes(total);
  if process.is_empty() && total_time.value.is_empty()
    && let (Some(s), Some(e)) = (parse_timestamp(&start), parse_timestamp(&stop))
    && let Some(m) = minutes_between(s, e)
  {
    total_time = RawDuration::minutes(RawValue::Number(m));
  }

  Some(IntermediateRow {
    ordinal,
    worker: operator.as_text(),
    date: entry_date,
    start_time: start,
    finish_time: stop,
    process_time: RawDuration::minutes(process),
    total_time,
    work_order: work_order.as_text(),
    customer: customer.as_text(),
    part_name: part_name.as_text(),
    material: material.as_text(),
    material_size: material_size.as_text(),
    parts: if parts_produced.is_empty() { total_parts } else { parts_produced },
    yield_value: yield_status,
    rejected_parts: RawValue::Empty,
    scrap_count: scrap,
    defect_count: defects,
    department: department.as_text(),
    task_ref: task.as_text(),
    notes: notes.as_text(),
  })
}
