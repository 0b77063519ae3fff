//! Run configuration.
//!
//! Deserialised by the binary from a TOML file layered with `QCR_*`
//! environment variables. Nothing here has a path baked in: a source that is
//! not configured is simply not read.

use std::path::PathBuf;

use qcr_core::{alias::AliasTable, attribution::CreditPolicy, date::DateWindow};
use qcr_sources::{DEFAULT_LIVE_TABLE, LiveSystemAdapter, SourceAdapter, SpreadsheetAdapter};
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
  /// Canonical store database file.
  #[serde(default = "default_store_path")]
  pub store_path:    PathBuf,
  /// TOML alias table. Without one every token is unresolved.
  #[serde(default)]
  pub alias_file:    Option<PathBuf>,
  /// Markdown roster used by `qcr roster`.
  #[serde(default)]
  pub roster_file:   Option<PathBuf>,
  #[serde(default)]
  pub sources:       SourcesConfig,
  #[serde(default)]
  pub date_window:   DateWindow,
  #[serde(default)]
  pub credit_policy: CreditPolicy,
  /// Remove stored origins that are no longer discovered.
  #[serde(default = "default_true")]
  pub prune_missing: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
  #[serde(default)]
  pub legacy_dir:  Option<PathBuf>,
  #[serde(default)]
  pub current_dir: Option<PathBuf>,
  #[serde(default)]
  pub live_db:     Option<PathBuf>,
  #[serde(default = "default_live_table")]
  pub live_table:  String,
}

fn default_store_path() -> PathBuf { PathBuf::from("qcr.db") }

fn default_true() -> bool { true }

fn default_live_table() -> String { DEFAULT_LIVE_TABLE.to_string() }

impl Default for SourcesConfig {
  fn default() -> Self {
    Self {
      legacy_dir:  None,
      current_dir: None,
      live_db:     None,
      live_table:  default_live_table(),
    }
  }
}

impl Default for ReconConfig {
  fn default() -> Self {
    Self {
      store_path:    default_store_path(),
      alias_file:    None,
      roster_file:   None,
      sources:       SourcesConfig::default(),
      date_window:   DateWindow::default(),
      credit_policy: CreditPolicy::default(),
      prune_missing: true,
    }
  }
}

impl ReconConfig {
  /// Adapters for every configured source, in processing order: legacy
  /// sheets, current sheets, then the live system.
  pub fn adapters(&self) -> Vec<Box<dyn SourceAdapter>> {
    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();
    if let Some(dir) = &self.sources.legacy_dir {
      adapters.push(Box::new(SpreadsheetAdapter::legacy(dir)));
    }
    if let Some(dir) = &self.sources.current_dir {
      adapters.push(Box::new(SpreadsheetAdapter::current(dir)));
    }
    if let Some(db) = &self.sources.live_db {
      adapters.push(Box::new(
        LiveSystemAdapter::new(db).with_table(self.sources.live_table.clone()),
      ));
    }
    adapters
  }

  /// The configured alias table, or an empty one.
  pub fn load_aliases(&self) -> Result<AliasTable> {
    match &self.alias_file {
      Some(path) => Ok(AliasTable::load(path)?),
      None => Ok(AliasTable::default()),
    }
  }
}

#[cfg(test)]
mod tests {
  use qcr_core::entry::SourceCategory;

  use super::*;

  #[test]
  fn defaults_without_any_keys() {
    let cfg: ReconConfig = toml::from_str("").unwrap();
    assert_eq!(cfg.store_path, PathBuf::from("qcr.db"));
    assert!(cfg.prune_missing);
    assert_eq!(cfg.credit_policy, CreditPolicy::EqualSplit);
    assert_eq!(cfg.sources.live_table, "qc_entries");
    assert_eq!(cfg.date_window, DateWindow::default());
    assert!(cfg.adapters().is_empty());
  }

  #[test]
  fn nested_tables_deserialise() {
    let cfg: ReconConfig = toml::from_str(
      r#"
      store_path    = "/var/lib/qcr/qcr.db"
      credit_policy = "primary_only"
      prune_missing = false

      [sources]
      current_dir = "/srv/qc/current"
      live_table  = "qc_rows"

      [date_window]
      min_year = 2015
      "#,
    )
    .unwrap();
    assert_eq!(cfg.credit_policy, CreditPolicy::PrimaryOnly);
    assert!(!cfg.prune_missing);
    assert_eq!(cfg.sources.live_table, "qc_rows");
    assert_eq!(cfg.date_window, DateWindow { min_year: 2015, max_year: 2100 });
    assert_eq!(cfg.adapters().len(), 1);
  }

  #[test]
  fn adapters_follow_configured_sources() {
    let cfg = ReconConfig {
      sources: SourcesConfig {
        legacy_dir: Some("legacy".into()),
        live_db: Some("live.db".into()),
        ..Default::default()
      },
      ..Default::default()
    };
    let categories: Vec<_> = cfg.adapters().iter().map(|a| a.category()).collect();
    assert_eq!(
      categories,
      vec![SourceCategory::LegacySpreadsheet, SourceCategory::LiveSystem]
    );
  }

  #[test]
  fn missing_alias_file_is_an_error() {
    let cfg = ReconConfig {
      alias_file: Some("/nonexistent/aliases.toml".into()),
      ..Default::default()
    };
    assert!(cfg.load_aliases().is_err());
  }
}
