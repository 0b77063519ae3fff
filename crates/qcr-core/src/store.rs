//! The `CanonicalStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `qcr-store-sqlite`).
//! The pipeline and the CLI depend on this abstraction, not on any concrete
//! backend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  entry::{CanonicalEntry, SourceCategory, ValidationIssue},
  identity::CanonicalIdentity,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`CanonicalStore::entries`]. Every filter is optional and
/// filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
  pub date_from:  Option<NaiveDate>,
  pub date_to:    Option<NaiveDate>,
  /// Matches the filed identity or any joint participant.
  pub identity:   Option<String>,
  pub department: Option<String>,
  pub source:     Option<SourceCategory>,
  pub origin:     Option<String>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

// ─── Origin batches ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum OriginStatus {
  Success,
  Failed(String),
}

impl OriginStatus {
  pub fn is_success(&self) -> bool { matches!(self, Self::Success) }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Success => "success",
      Self::Failed(_) => "failed",
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      Self::Success => None,
      Self::Failed(e) => Some(e),
    }
  }
}

/// Everything one extraction pass produced for an origin. Written with
/// [`CanonicalStore::replace_origin`] as one unit.
#[derive(Debug, Clone)]
pub struct OriginBatch {
  pub source:   SourceCategory,
  pub origin:   String,
  pub location: Option<String>,
  pub entries:  Vec<CanonicalEntry>,
  pub issues:   Vec<ValidationIssue>,
  /// Rows discarded before normalisation finished (bad or implausible date).
  pub dropped:  usize,
  pub status:   OriginStatus,
}

impl OriginBatch {
  /// An empty batch recording that the origin could not be read.
  pub fn failed(
    source: SourceCategory,
    origin: impl Into<String>,
    location: Option<String>,
    error: impl Into<String>,
  ) -> Self {
    Self {
      source,
      origin: origin.into(),
      location,
      entries: Vec::new(),
      issues: Vec::new(),
      dropped: 0,
      status: OriginStatus::Failed(error.into()),
    }
  }
}

/// What [`CanonicalStore::replace_origin`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaceOutcome {
  /// Rows the previous pass had written.
  pub removed: usize,
  pub written: usize,
  /// Rows refused by a row-level constraint.
  pub skipped: usize,
}

/// Import metadata for one origin.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginRecord {
  pub source:       SourceCategory,
  pub origin:       String,
  pub location:     Option<String>,
  pub rows_written: usize,
  pub rows_dropped: usize,
  pub rows_skipped: usize,
  pub unresolved:   usize,
  pub imported_at:  DateTime<Utc>,
  pub status:       OriginStatus,
}

/// A validation issue together with the origin that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIssue {
  pub source: SourceCategory,
  pub origin: String,
  pub issue:  ValidationIssue,
}

/// A distinct raw worker token and how often it appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCount {
  pub token:    String,
  pub rows:     usize,
  /// Whether the stored rows carrying this token have a resolved identity.
  pub resolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  Inserted,
  Updated,
  Unchanged,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a canonical record store backend.
///
/// Entries are never edited in place: an origin's rows are only ever replaced
/// wholesale by the next extraction pass over that origin.
pub trait CanonicalStore {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Entries ───────────────────────────────────────────────────────────

  /// Atomically replace every entry and issue previously written for the
  /// batch's origin, and record its metadata.
  fn replace_origin(
    &mut self,
    batch: &OriginBatch,
  ) -> Result<ReplaceOutcome, Self::Error>;

  /// Remove an origin's entries, issues and metadata. Returns the number of
  /// entries removed.
  fn remove_origin(
    &mut self,
    source: SourceCategory,
    origin: &str,
  ) -> Result<usize, Self::Error>;

  fn entries(&self, query: &EntryQuery) -> Result<Vec<CanonicalEntry>, Self::Error>;

  fn count_entries(&self, query: &EntryQuery) -> Result<usize, Self::Error>;

  /// Distinct raw worker tokens across all stored entries, most frequent
  /// first.
  fn worker_tokens(&self) -> Result<Vec<TokenCount>, Self::Error>;

  // ── Origins ───────────────────────────────────────────────────────────

  fn list_origins(
    &self,
    source: Option<SourceCategory>,
  ) -> Result<Vec<OriginRecord>, Self::Error>;

  fn validation_issues(
    &self,
    source: Option<SourceCategory>,
    origin: Option<&str>,
  ) -> Result<Vec<StoredIssue>, Self::Error>;

  // ── Identities ────────────────────────────────────────────────────────

  /// Insert or update by name. Never deletes.
  fn upsert_identity(
    &mut self,
    identity: &CanonicalIdentity,
  ) -> Result<UpsertOutcome, Self::Error>;

  fn get_identity(&self, name: &str) -> Result<Option<CanonicalIdentity>, Self::Error>;

  fn identities(&self) -> Result<Vec<CanonicalIdentity>, Self::Error>;
}
