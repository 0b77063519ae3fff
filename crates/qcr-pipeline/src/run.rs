//! One reconciliation run over every configured source.

use std::{
  collections::{BTreeMap, HashSet},
  fmt,
};

use qcr_core::{
  entry::{IssueKind, SourceCategory},
  resolve::Resolver,
  store::{CanonicalStore, OriginBatch, OriginStatus, ReplaceOutcome},
};
use qcr_sources::{Extraction, Origin, SourceAdapter};
use tracing::{error, info, warn};

use crate::{
  Error, Result,
  config::ReconConfig,
  normalize::{Normalized, Normalizer},
};

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
  Completed,
  /// The store failed; origins committed before the failure are kept.
  Aborted(String),
}

/// Per-origin outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginReport {
  pub source:     SourceCategory,
  pub origin:     String,
  pub status:     OriginStatus,
  pub written:    usize,
  pub dropped:    usize,
  pub skipped:    usize,
  pub unresolved: usize,
  pub issues:     usize,
}

impl OriginReport {
  fn new(batch: &OriginBatch, outcome: ReplaceOutcome) -> Self {
    Self {
      source:     batch.source,
      origin:     batch.origin.clone(),
      status:     batch.status.clone(),
      written:    outcome.written,
      dropped:    batch.dropped,
      skipped:    outcome.skipped,
      unresolved: batch.entries.iter().filter(|e| e.identity.is_none()).count(),
      issues:     batch.issues.len(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
  pub state:        RunState,
  pub origins:      Vec<OriginReport>,
  /// Categories whose origins could not be listed, with the reason.
  pub unavailable:  Vec<(SourceCategory, String)>,
  /// Origins removed because their source no longer exists.
  pub pruned:       Vec<(SourceCategory, String)>,
  pub issue_counts: BTreeMap<IssueKind, usize>,
}

impl Default for RunSummary {
  fn default() -> Self {
    Self {
      state:        RunState::Completed,
      origins:      Vec::new(),
      unavailable:  Vec::new(),
      pruned:       Vec::new(),
      issue_counts: BTreeMap::new(),
    }
  }
}

impl RunSummary {
  pub fn is_completed(&self) -> bool { self.state == RunState::Completed }

  pub fn failed_origins(&self) -> impl Iterator<Item = &OriginReport> {
    self.origins.iter().filter(|o| !o.status.is_success())
  }

  pub fn rows_written(&self) -> usize { self.origins.iter().map(|o| o.written).sum() }

  fn abort(&mut self, e: impl fmt::Display) {
    error!(error = %e, "store failure, aborting run");
    self.state = RunState::Aborted(e.to_string());
  }
}

impl fmt::Display for RunSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for o in &self.origins {
      write!(
        f,
        "{:<20} {:<40} {:>6} written {:>4} dropped {:>4} skipped {:>4} unresolved",
        o.source.as_str(), o.origin, o.written, o.dropped, o.skipped, o.unresolved
      )?;
      match o.status.error() {
        Some(e) => writeln!(f, "  FAILED: {e}")?,
        None => writeln!(f)?,
      }
    }
    for (source, reason) in &self.unavailable {
      writeln!(f, "{:<20} unavailable: {reason}", source.as_str())?;
    }
    for (source, origin) in &self.pruned {
      writeln!(f, "{:<20} {origin:<40} pruned", source.as_str())?;
    }
    if !self.issue_counts.is_empty() {
      writeln!(f, "issues:")?;
      for (kind, n) in &self.issue_counts {
        writeln!(f, "  {:<22} {n}", kind.as_str())?;
      }
    }
    match &self.state {
      RunState::Completed => write!(
        f,
        "completed: {} origins, {} rows written, {} failed",
        self.origins.len(),
        self.rows_written(),
        self.failed_origins().count()
      ),
      RunState::Aborted(e) => write!(f, "aborted: {e}"),
    }
  }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

pub struct Pipeline<'a, S> {
  store:         &'a mut S,
  normalizer:    Normalizer<'a>,
  prune_missing: bool,
}

impl<'a, S: CanonicalStore> Pipeline<'a, S> {
  /// Build a pipeline writing to `store`. Roster identities already in the
  /// store supply department fallbacks.
  pub fn new(store: &'a mut S, resolver: &'a Resolver, config: &ReconConfig) -> Result<Self> {
    let roster = store.identities().map_err(Error::store)?;
    let normalizer = Normalizer::new(resolver, config.date_window).with_roster(&roster);
    Ok(Self { store, normalizer, prune_missing: config.prune_missing })
  }

  /// Process every adapter in order. Never returns early on an origin
  /// failure; a store failure ends the run as [`RunState::Aborted`].
  pub fn run(&mut self, adapters: &[Box<dyn SourceAdapter>]) -> RunSummary {
    let mut summary = RunSummary::default();
    for adapter in adapters {
      let source = adapter.category();
      let origins = match adapter.discover() {
        Ok(origins) => origins,
        Err(e) => {
          warn!(%source, error = %e, "source unavailable, leaving stored origins untouched");
          summary.unavailable.push((source, e.to_string()));
          continue;
        }
      };

      for origin in &origins {
        match self.process(adapter.as_ref(), origin) {
          Ok((report, issues)) => {
            for kind in issues {
              *summary.issue_counts.entry(kind).or_default() += 1;
            }
            summary.origins.push(report);
          }
          Err(e) => {
            summary.abort(e);
            return summary;
          }
        }
      }

      if self.prune_missing {
        match self.prune(source, &origins) {
          Ok(pruned) => summary.pruned.extend(pruned.into_iter().map(|o| (source, o))),
          Err(e) => {
            summary.abort(e);
            return summary;
          }
        }
      }
    }
    info!(
      origins = summary.origins.len(),
      rows = summary.rows_written(),
      failed = summary.failed_origins().count(),
      "run completed"
    );
    summary
  }

  /// Extract, normalise and replace one origin.
  fn process(
    &mut self,
    adapter: &dyn SourceAdapter,
    origin: &Origin,
  ) -> Result<(OriginReport, Vec<IssueKind>), S::Error> {
    let source = adapter.category();
    let location = Some(origin.location.display().to_string());
    let batch = match adapter.extract(origin) {
      Ok(extraction) => self.batch(source, origin, location, extraction),
      Err(e) => {
        warn!(%source, origin = %origin.reference, error = %e, "origin failed");
        OriginBatch::failed(source, &origin.reference, location, e.to_string())
      }
    };

    let outcome = self.store.replace_origin(&batch)?;
    let report = OriginReport::new(&batch, outcome);
    info!(
      %source,
      origin = %report.origin,
      status = report.status.as_str(),
      written = report.written,
      dropped = report.dropped,
      skipped = report.skipped,
      unresolved = report.unresolved,
      "imported origin"
    );
    Ok((report, batch.issues.iter().map(|i| i.kind).collect()))
  }

  fn batch(
    &self,
    source: SourceCategory,
    origin: &Origin,
    location: Option<String>,
    extraction: Extraction,
  ) -> OriginBatch {
    let Extraction { rows, mut issues, mut dropped } = extraction;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
      match self.normalizer.normalize(source, &origin.reference, row) {
        Normalized::Entry { entry, issues: found } => {
          entries.push(*entry);
          issues.extend(found);
        }
        Normalized::Dropped => dropped += 1,
      }
    }
    issues.sort_by_key(|i| i.ordinal);
    OriginBatch {
      source,
      origin: origin.reference.clone(),
      location,
      entries,
      issues,
      dropped,
      status: OriginStatus::Success,
    }
  }

  /// Remove stored origins of `source` that discovery no longer lists.
  fn prune(&mut self, source: SourceCategory, found: &[Origin]) -> Result<Vec<String>, S::Error> {
    let current: HashSet<&str> = found.iter().map(|o| o.reference.as_str()).collect();
    let mut pruned = Vec::new();
    for record in self.store.list_origins(Some(source))? {
      if current.contains(record.origin.as_str()) {
        continue;
      }
      let removed = self.store.remove_origin(source, &record.origin)?;
      info!(%source, origin = %record.origin, removed, "pruned vanished origin");
      pruned.push(record.origin);
    }
    Ok(pruned)
  }
}
