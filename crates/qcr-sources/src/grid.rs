//! Loading a spreadsheet file into a plain grid of [`RawValue`]s.
//!
//! Workbooks (`.xlsx`, `.xlsm`, `.xls`, `.xlsb`, `.ods`) go through calamine;
//! `.csv` goes through the csv crate. Dates in workbooks stay as serial day
//! numbers; they are interpreted later.

use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use qcr_core::entry::RawValue;

use crate::{Error, Result};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// A worksheet as rows of cells, addressed by absolute sheet position.
#[derive(Debug, Clone, Default)]
pub struct Grid {
  pub sheet: String,
  rows:      Vec<Vec<RawValue>>,
  /// Zero-based sheet index of `rows[0]`.
  first_row: usize,
}

impl Grid {
  pub fn from_rows(sheet: impl Into<String>, rows: Vec<Vec<RawValue>>) -> Self {
    Self { sheet: sheet.into(), rows, first_row: 0 }
  }

  pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|e| e == "csv" || WORKBOOK_EXTENSIONS.contains(&e.as_str()))
  }

  /// Rows with their 1-based sheet row number.
  pub fn rows(&self) -> impl Iterator<Item = (u32, &[RawValue])> {
    self
      .rows
      .iter()
      .enumerate()
      .map(|(i, r)| ((self.first_row + i + 1) as u32, r.as_slice()))
  }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}

fn extension(path: &Path) -> Option<String> {
  path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase)
}

/// Load one worksheet: `preferred` if the workbook has a sheet of that name
/// (case-insensitive), otherwise the first.
pub fn load_grid(path: &Path, preferred: Option<&str>) -> Result<Grid> {
  match extension(path).as_deref() {
    Some("csv") => load_csv(path),
    Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext) => load_workbook(path, preferred),
    other => Err(Error::UnsupportedExtension(other.unwrap_or_default().to_string())),
  }
}

fn load_workbook(path: &Path, preferred: Option<&str>) -> Result<Grid> {
  let workbook_err = |source| Error::Workbook { path: path.to_path_buf(), source };

  let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(workbook_err)?;
  let names: Vec<String> = workbook.sheet_names().to_vec();
  let sheet = preferred
    .and_then(|p| names.iter().find(|n| n.trim().eq_ignore_ascii_case(p)))
    .or_else(|| names.first())
    .cloned()
    .ok_or(Error::NoSheets)?;

  let range = workbook.worksheet_range(&sheet).map_err(workbook_err)?;
  let (first_row, first_col) = range
    .start()
    .map(|(r, c)| (r as usize, c as usize))
    .unwrap_or_default();

  let rows = range
    .rows()
    .map(|row| {
      std::iter::repeat_n(RawValue::Empty, first_col)
        .chain(row.iter().map(cell_value))
        .collect::<Vec<_>>()
    })
    .collect();

  Ok(Grid { sheet, rows, first_row })
}

fn cell_value(cell: &Data) -> RawValue {
  match cell {
    Data::Empty | Data::Error(_) => RawValue::Empty,
    Data::String(s) => RawValue::text(Some(s.as_str())),
    Data::Float(n) => RawValue::Number(*n),
    Data::Int(n) => RawValue::Number(*n as f64),
    Data::Bool(b) => RawValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
    Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
    Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
  }
}

fn load_csv(path: &Path) -> Result<Grid> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .from_path(path)?;

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    rows.push(record.iter().map(|f| RawValue::text(Some(f))).collect::<Vec<_>>());
  }
  let sheet = path
    .file_stem()
    .and_then(|s| s.to_str())
    .unwrap_or_default()
    .to_string();
  Ok(Grid::from_rows(sheet, rows))
}
