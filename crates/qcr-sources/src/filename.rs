//! Work order and customer parsed from a spreadsheet's file name.
//!
//! Sheets are usually named like `Acme Corp PO 12345.xlsx` or
//! `Acme Corp 12345 brackets.xlsx`.

use std::{path::Path, sync::LazyLock};

use regex::Regex;

static PO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\bPO\s*#?\s*([A-Z0-9\-]*[0-9][A-Z0-9\-]*)").expect("valid regex")
});

static FIRST_NUMBER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\s+\d").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileInfo {
  pub work_order: Option<String>,
  pub customer:   Option<String>,
}

/// Customer is the text before the `PO` marker, or before the first
/// whitespace-separated number when there is no marker.
pub fn parse_filename(path: &Path) -> FileInfo {
  let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().trim();

  let (work_order, customer) = match PO_PATTERN.captures(stem) {
    Some(caps) => {
      let whole = caps.get(0).map_or(0, |m| m.start());
      (caps.get(1).map(|m| m.as_str().to_string()), &stem[..whole])
    }
    None => {
      let end = FIRST_NUMBER.find(stem).map_or(stem.len(), |m| m.start());
      (None, &stem[..end])
    }
  };

  let customer = customer.trim().trim_end_matches(['-', '_', ',']).trim();
  FileInfo {
    work_order,
    customer: (!customer.is_empty()).then(|| customer.to_string()),
  }
}
