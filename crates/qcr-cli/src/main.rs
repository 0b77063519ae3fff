//! `qcr`: reconcile QC records into one canonical store.
//!
//! # Usage
//!
//! ```text
//! qcr --config qcr.toml migrate
//! qcr roster docs/roster.md
//! qcr run --only current
//! qcr resolve "JE, MK"
//! qcr tokens --unresolved
//! qcr credit "Jordan Ellis" --from 2025-07-01 --policy primary_only
//! ```
//!
//! Settings come from the config file layered with `QCR_*` environment
//! variables; nested keys use `__`, e.g. `QCR_SOURCES__LIVE_DB`.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use qcr_core::{
  attribution::CreditPolicy,
  entry::SourceCategory,
  resolve::{Resolution, Resolver},
  store::CanonicalStore,
};
use qcr_pipeline::{Pipeline, ReconConfig, credit_report, seed_roster, token_report};
use qcr_sources::SourceAdapter as _;
use qcr_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "QC record reconciliation")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "qcr.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create or upgrade the canonical store schema.
  Migrate,

  /// Seed canonical identities from a roster document.
  Roster {
    /// Roster file; defaults to `roster_file` from the config.
    file: Option<PathBuf>,
  },

  /// Reconcile every configured source into the store.
  Run {
    /// Only process this source category (legacy, current, live).
    #[arg(long)]
    only: Option<SourceCategory>,
  },

  /// Show how raw worker tokens resolve against the alias table.
  Resolve {
    #[arg(required = true)]
    tokens: Vec<String>,
    #[arg(long)]
    json:   bool,
  },

  /// List stored worker tokens with their current resolution.
  Tokens {
    /// Only tokens that do not resolve.
    #[arg(long)]
    unresolved: bool,
  },

  /// Credit an identity with its share of stored entries.
  Credit {
    identity: String,
    #[arg(long)]
    from:     Option<NaiveDate>,
    #[arg(long)]
    to:       Option<NaiveDate>,
    /// Overrides `credit_policy` from the config.
    #[arg(long)]
    policy:   Option<CreditPolicy>,
    #[arg(long)]
    json:     bool,
  },

  /// List imported origins and their last status.
  Origins {
    #[arg(long)]
    source: Option<SourceCategory>,
  },

  /// List validation issues.
  Issues {
    #[arg(long)]
    source: Option<SourceCategory>,
    #[arg(long)]
    origin: Option<String>,
  },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = load_config(&cli.config)?;

  match cli.command {
    Command::Migrate => {
      let store = open_store(&config)?;
      println!("schema version {}", store.schema_version()?);
    }
    Command::Roster { file } => {
      let Some(path) = file.or_else(|| config.roster_file.clone()) else {
        bail!("no roster file given and `roster_file` is not configured");
      };
      let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read roster {}", path.display()))?;
      let aliases = config.load_aliases().context("failed to load alias table")?;
      let mut store = open_store(&config)?;
      let report = seed_roster(&mut store, &text, &aliases)?;
      println!(
        "{} inserted, {} updated, {} unchanged, {} rejected",
        report.inserted,
        report.updated,
        report.unchanged,
        report.rejected.len()
      );
      for (line, text) in &report.rejected {
        println!("  line {line}: {text}");
      }
    }
    Command::Run { only } => {
      let resolver = resolver(&config)?;
      let mut store = open_store(&config)?;
      let adapters: Vec<_> = config
        .adapters()
        .into_iter()
        .filter(|a| only.is_none_or(|c| a.category() == c))
        .collect();
      if adapters.is_empty() {
        bail!("no sources configured");
      }
      let summary = Pipeline::new(&mut store, &resolver, &config)?.run(&adapters);
      println!("{summary}");
      if !summary.is_completed() {
        bail!("run aborted");
      }
    }
    Command::Resolve { tokens, json } => {
      let resolver = resolver(&config)?;
      for token in tokens {
        let resolution = resolver.resolve(&token);
        if json {
          println!("{}", serde_json::to_string(&resolution)?);
        } else {
          println!("{token:?} → {}", describe(&resolution));
        }
      }
    }
    Command::Tokens { unresolved } => {
      let resolver = resolver(&config)?;
      let store = open_store(&config)?;
      for t in token_report(&store, &resolver)? {
        if unresolved && t.resolution.is_resolved() {
          continue;
        }
        println!("{:>6}  {:<30} {}", t.rows, t.token, describe(&t.resolution));
      }
    }
    Command::Credit { identity, from, to, policy, json } => {
      let resolver = resolver(&config)?;
      if !resolver.table().contains(&identity) {
        bail!("{identity:?} is not in the alias table");
      }
      let store = open_store(&config)?;
      let policy = policy.unwrap_or(config.credit_policy);
      let report = credit_report(&store, &resolver, &identity, policy, from, to)?;
      if json {
        println!("{}", serde_json::to_string_pretty(&report.credit)?);
      } else {
        let c = &report.credit;
        println!("{} ({})", c.identity, report.policy);
        println!("  entries        {} ({} joint)", c.entries, c.joint_entries);
        println!("  weight         {:.2}", c.weight);
        println!("  minutes        {:.1}", c.minutes);
        println!("  parts produced {:.1}", c.parts_produced);
        println!("  tokens         {}", report.tokens.join(", "));
      }
    }
    Command::Origins { source } => {
      let store = open_store(&config)?;
      for o in store.list_origins(source)? {
        println!(
          "{:<20} {:<40} {:<8} {:>6} written {:>4} dropped  {}",
          o.source.as_str(),
          o.origin,
          o.status.as_str(),
          o.rows_written,
          o.rows_dropped,
          o.imported_at.format("%Y-%m-%d %H:%M:%S"),
        );
        if let Some(e) = o.status.error() {
          println!("  {e}");
        }
      }
    }
    Command::Issues { source, origin } => {
      let store = open_store(&config)?;
      for i in store.validation_issues(source, origin.as_deref())? {
        println!(
          "{:<20} {:<40} {:>6}  {:<20} {}",
          i.source.as_str(),
          i.origin,
          i.issue.ordinal,
          i.issue.kind.as_str(),
          i.issue.detail
        );
      }
    }
  }
  Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn load_config(path: &Path) -> anyhow::Result<ReconConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("QCR")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let mut cfg: ReconConfig = settings
    .try_deserialize()
    .context("failed to deserialise ReconConfig")?;

  // Expand `~` in every configured path.
  cfg.store_path = expand_tilde(&cfg.store_path);
  for path in [
    &mut cfg.alias_file,
    &mut cfg.roster_file,
    &mut cfg.sources.legacy_dir,
    &mut cfg.sources.current_dir,
    &mut cfg.sources.live_db,
  ]
  .into_iter()
  .flatten()
  {
    *path = expand_tilde(path);
  }
  Ok(cfg)
}

fn open_store(cfg: &ReconConfig) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(&cfg.store_path)
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))
}

fn resolver(cfg: &ReconConfig) -> anyhow::Result<Resolver> {
  let table = cfg.load_aliases().context("failed to load alias table")?;
  if table.is_empty() {
    tracing::warn!("alias table is empty; every worker token will be unresolved");
  }
  Ok(Resolver::new(table))
}

fn describe(resolution: &Resolution) -> String {
  match resolution {
    Resolution::Single(name) => name.clone(),
    Resolution::Joint(names) => format!("joint: {}", names.join(" + ")),
    Resolution::Ambiguous(names) => format!("ambiguous: {}", names.join(" | ")),
    Resolution::Unresolved => "unresolved".to_string(),
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn cli_definition_is_consistent() { Cli::command().debug_assert(); }

  #[test]
  fn credit_parses_dates_and_policy() {
    let cli = Cli::try_parse_from([
      "qcr",
      "credit",
      "Jordan Ellis",
      "--from",
      "2025-07-01",
      "--policy",
      "primary_only",
    ])
    .unwrap();
    let Command::Credit { identity, from, policy, .. } = cli.command else {
      panic!("expected credit");
    };
    assert_eq!(identity, "Jordan Ellis");
    assert_eq!(from, NaiveDate::from_ymd_opt(2025, 7, 1));
    assert_eq!(policy, Some(CreditPolicy::PrimaryOnly));
    assert_eq!(cli.config, PathBuf::from("qcr.toml"));
  }
}
