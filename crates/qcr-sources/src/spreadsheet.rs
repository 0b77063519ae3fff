//! The spreadsheet adapter shared by both sheet layouts.
//!
//! Pipeline per origin:
//!   file
//!     └─ load_grid()          → Grid
//!          └─ Header::locate()  → column labels
//!               └─ Layout::columns() → Columns
//!                    └─ extract_rows()  → Extraction

use std::path::PathBuf;

use qcr_core::{
  date::parse_raw_date,
  duration::RawDuration,
  entry::{IntermediateRow, RawValue, SourceCategory},
};
use tracing::{debug, info};

use crate::{
  Error, Result,
  adapter::{Extraction, Origin, SourceAdapter},
  current,
  filename::{FileInfo, parse_filename},
  grid::{Grid, load_grid},
  header::{Header, cell, text},
  legacy,
};

/// Which generation of QC sheet a directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
  Legacy,
  Current,
}

impl Layout {
  pub fn category(self) -> SourceCategory {
    match self {
      Self::Legacy => SourceCategory::LegacySpreadsheet,
      Self::Current => SourceCategory::CurrentSpreadsheet,
    }
  }

  fn preferred_sheet(self) -> Option<&'static str> {
    match self {
      Self::Legacy => None,
      Self::Current => Some(current::SHEET_NAME),
    }
  }

  fn columns(self, header: &Header) -> Columns {
    match self {
      Self::Legacy => legacy::columns(header),
      Self::Current => current::columns(header),
    }
  }
}

/// Resolved column indices for one sheet. `None` means the sheet has no such
/// column and the field reads as blank.
#[derive(Debug, Clone, Default)]
pub(crate) struct Columns {
  pub date:          Option<usize>,
  pub worker:        Option<usize>,
  pub department:    Option<usize>,
  pub part_name:     Option<usize>,
  pub start:         Option<usize>,
  pub finish:        Option<usize>,
  pub process:       Option<usize>,
  pub total:         Option<usize>,
  pub material:      Option<usize>,
  pub material_size: Option<usize>,
  pub parts:         Option<usize>,
  pub yield_value:   Option<usize>,
  pub rejected:      Option<usize>,
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

/// Reads every QC sheet in one directory.
#[derive(Debug, Clone)]
pub struct SpreadsheetAdapter {
  layout: Layout,
  dir:    PathBuf,
}

impl SpreadsheetAdapter {
  pub fn new(layout: Layout, dir: impl Into<PathBuf>) -> Self {
    Self { layout, dir: dir.into() }
  }

  pub fn legacy(dir: impl Into<PathBuf>) -> Self { Self::new(Layout::Legacy, dir) }

  pub fn current(dir: impl Into<PathBuf>) -> Self { Self::new(Layout::Current, dir) }
}

/// Lock files (`~$…`) and templates (`_…`) are never origins.
fn is_candidate(name: &str) -> bool { !name.starts_with("~$") && !name.starts_with('_') }

impl SourceAdapter for SpreadsheetAdapter {
  fn category(&self) -> SourceCategory { self.layout.category() }

  fn discover(&self) -> Result<Vec<Origin>> {
    let mut origins = Vec::new();
    for entry in std::fs::read_dir(&self.dir)? {
      let entry = entry?;
      let path = entry.path();
      let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        continue;
      };
      if entry.file_type()?.is_file() && is_candidate(name) && Grid::is_supported(&path) {
        origins.push(Origin { reference: name.to_string(), location: path.clone() });
      }
    }
    origins.sort_by(|a, b| a.reference.cmp(&b.reference));
    info!(
      dir = %self.dir.display(),
      count = origins.len(),
      source = %self.category(),
      "discovered spreadsheets"
    );
    Ok(origins)
  }

  fn extract(&self, origin: &Origin) -> Result<Extraction> {
    let grid = load_grid(&origin.location, self.layout.preferred_sheet())?;
    let header = Header::locate(&grid).ok_or(Error::MissingHeader)?;
    let columns = self.layout.columns(&header);
    let file = parse_filename(&origin.location);
    debug!(
      origin = %origin.reference,
      sheet = %grid.sheet,
      header_row = header.row,
      "located header"
    );
    Ok(extract_rows(&grid, &header, &columns, &file))
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

pub(crate) fn extract_rows(
  grid: &Grid,
  header: &Header,
  cols: &Columns,
  file: &FileInfo,
) -> Extraction {
  let mut out = Extraction::default();
  for (ordinal, cells) in grid.rows().filter(|(n, _)| *n > header.row) {
    if cells.iter().all(RawValue::is_empty) {
      continue;
    }
    let date = cell(cells, cols.date);
    if parse_raw_date(&date).is_none() {
      debug!(ordinal, ?date, "dropping row without a readable date");
      out.dropped += 1;
      continue;
    }

    out.rows.push(IntermediateRow {
      ordinal,
      worker: text(cells, cols.worker),
      date,
      start_time: cell(cells, cols.start),
      finish_time: cell(cells, cols.finish),
      process_time: RawDuration::untagged(cell(cells, cols.process)),
      total_time: RawDuration::untagged(cell(cells, cols.total)),
      work_order: file.work_order.clone(),
      customer: file.customer.clone(),
      part_name: text(cells, cols.part_name),
      material: text(cells, cols.material),
      material_size: text(cells, cols.material_size),
      parts: cell(cells, cols.parts),
      yield_value: cell(cells, cols.yield_value),
      rejected_parts: cell(cells, cols.rejected),
      department: text(cells, cols.department),
      ..Default::default()
    });
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lock_files_and_templates_are_skipped() {
    assert!(is_candidate("Acme PO 1.xlsx"));
    assert!(!is_candidate("~$Acme PO 1.xlsx"));
    assert!(!is_candidate("_template.xlsx"));
  }

  #[test]
  fn discovery_is_sorted_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.csv", "a.xlsx", "~$a.xlsx", "_blank.xlsx", "notes.txt"] {
      std::fs::write(dir.path().join(name), "").unwrap();
    }
    std::fs::create_dir(dir.path().join("c.xlsx")).unwrap();

    let origins = SpreadsheetAdapter::legacy(dir.path()).discover().unwrap();
    let names: Vec<_> = origins.iter().map(|o| o.reference.as_str()).collect();
    assert_eq!(names, vec!["a.xlsx", "b.csv"]);
  }

  #[test]
  fn missing_directory_is_an_error() {
    let adapter = SpreadsheetAdapter::current("/nonexistent/qc/sheets");
    assert!(matches!(adapter.discover(), Err(Error::Io(_))));
  }
}
