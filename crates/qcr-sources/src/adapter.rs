//! The `SourceAdapter` trait.

use std::path::PathBuf;

use qcr_core::entry::{IntermediateRow, SourceCategory, ValidationIssue};

use crate::Result;

/// One independently re-importable unit: a spreadsheet file, or the live
/// database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
  /// Stable key for the origin (its file name).
  pub reference: String,
  pub location:  PathBuf,
}

/// Everything extracted from one origin.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
  pub rows:    Vec<IntermediateRow>,
  /// Row-level findings raised during extraction.
  pub issues:  Vec<ValidationIssue>,
  /// Non-blank rows discarded because their date could not be read.
  pub dropped: usize,
}

pub trait SourceAdapter {
  fn category(&self) -> SourceCategory;

  /// List origins in a stable order.
  fn discover(&self) -> Result<Vec<Origin>>;

  /// Parse one origin. An `Err` is a structural failure of that origin only.
  fn extract(&self, origin: &Origin) -> Result<Extraction>;
}
