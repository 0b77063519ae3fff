//! Locating the header row of a QC sheet and resolving column labels.

use qcr_core::entry::RawValue;

use crate::grid::Grid;

/// How many leading cells are inspected when looking for the header row.
const HEADER_SCAN_WIDTH: usize = 15;

/// The header row of a sheet: each non-blank label (trimmed, upper-cased,
/// whitespace collapsed) with its column index, in column order.
#[derive(Debug, Clone)]
pub struct Header {
  /// 1-based sheet row number of the header.
  pub row:    u32,
  labels: Vec<(String, usize)>,
}

impl Header {
  /// The first row whose leading cells mention both `DATE` and `OPERATOR`.
  pub fn locate(grid: &Grid) -> Option<Self> {
    grid.rows().find_map(|(row, cells)| {
      let joined = cells
        .iter()
        .take(HEADER_SCAN_WIDTH)
        .filter_map(RawValue::as_text)
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
      (joined.contains("DATE") && joined.contains("OPERATOR"))
        .then(|| Self::from_cells(row, cells))
    })
  }

  pub fn from_cells(row: u32, cells: &[RawValue]) -> Self {
    let labels = cells
      .iter()
      .enumerate()
      .filter_map(|(col, cell)| Some((normalize_label(&cell.as_text()?), col)))
      .collect();
    Self { row, labels }
  }

  /// Column of the first label exactly equal to one of `candidates`, tried
  /// in order.
  pub fn exact(&self, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|want| {
      self
        .labels
        .iter()
        .find(|(label, _)| label == want)
        .map(|(_, col)| *col)
    })
  }

  /// Column of the leftmost label containing `needle`.
  pub fn containing(&self, needle: &str) -> Option<usize> {
    self
      .labels
      .iter()
      .find(|(label, _)| label.contains(needle))
      .map(|(_, col)| *col)
  }
}

fn normalize_label(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

/// The cell at `col`, or `Empty` when the row is short or the column absent.
pub fn cell(cells: &[RawValue], col: Option<usize>) -> RawValue {
  col.and_then(|c| cells.get(c)).cloned().unwrap_or_default()
}

/// The trimmed text at `col`, if any.
pub fn text(cells: &[RawValue], col: Option<usize>) -> Option<String> {
  col.and_then(|c| cells.get(c)).and_then(RawValue::as_text)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn t(s: &str) -> RawValue { RawValue::Text(s.to_string()) }

  fn grid() -> Grid {
    Grid::from_rows(
      "QC Sheet",
      vec![
        vec![t("Acme QC log")],
        vec![],
        vec![
          t("DATE (MM/DD/YYYY) CTRL + ;"),
          t("Department"),
          t("  operator "),
          t("PROCESS  TIME (MINUTES)"),
          t("PROCESS TIME"),
        ],
        vec![t("7/15/2025"), t("Saws"), t("JE")],
      ],
    )
  }

  #[test]
  fn locates_header_below_title_rows() {
    let h = Header::locate(&grid()).unwrap();
    assert_eq!(h.row, 3);
    assert_eq!(h.containing("DATE"), Some(0));
    assert_eq!(h.containing("OPERATOR"), Some(2));
  }

  #[test]
  fn exact_lookup_respects_candidate_order() {
    let h = Header::locate(&grid()).unwrap();
    assert_eq!(h.exact(&["PROCESS TIME (MINUTES)", "PROCESS TIME"]), Some(3));
    assert_eq!(h.exact(&["PROCESS TIME"]), Some(4));
    assert_eq!(h.exact(&["YIELD"]), None);
  }

  #[test]
  fn missing_header_is_none() {
    let g = Grid::from_rows("x", vec![vec![t("DATE"), t("NAME")]]);
    assert!(Header::locate(&g).is_none());
  }

  #[test]
  fn short_rows_read_as_empty() {
    let cells = [t("a")];
    assert_eq!(cell(&cells, Some(4)), RawValue::Empty);
    assert_eq!(text(&cells, Some(0)).as_deref(), Some("a"));
    assert_eq!(text(&cells, None), None);
  }
}
