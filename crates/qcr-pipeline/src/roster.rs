//! Seeding canonical identities from a roster document.

use qcr_core::{
  alias::AliasTable,
  roster::parse_roster,
  store::{CanonicalStore, UpsertOutcome},
};
use tracing::{info, warn};

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterReport {
  pub inserted:  usize,
  pub updated:   usize,
  pub unchanged: usize,
  /// Worker lines that could not be parsed: (line number, text).
  pub rejected:  Vec<(usize, String)>,
  /// Roster names with no entry in the alias table.
  pub unaliased: Vec<String>,
}

/// Upsert every identity in `text`. Identities already stored but absent
/// from the roster are left alone.
pub fn seed_roster<S: CanonicalStore>(
  store: &mut S,
  text: &str,
  aliases: &AliasTable,
) -> Result<RosterReport> {
  let parsed = parse_roster(text);
  let mut report = RosterReport { rejected: parsed.rejected, ..Default::default() };
  for (line, raw) in &report.rejected {
    warn!(line, text = %raw, "skipping malformed roster line");
  }

  for identity in &parsed.identities {
    match store.upsert_identity(identity).map_err(Error::store)? {
      UpsertOutcome::Inserted => report.inserted += 1,
      UpsertOutcome::Updated => report.updated += 1,
      UpsertOutcome::Unchanged => report.unchanged += 1,
    }
    if !aliases.is_empty() && !aliases.contains(&identity.name) {
      warn!(name = %identity.name, "roster identity has no alias entry");
      report.unaliased.push(identity.name.clone());
    }
  }
  for name in aliases.names() {
    if !parsed.identities.iter().any(|i| i.name == name) {
      warn!(name, "alias table identity is not on the roster");
    }
  }

  info!(
    inserted = report.inserted,
    updated = report.updated,
    unchanged = report.unchanged,
    rejected = report.rejected.len(),
    "seeded roster"
  );
  Ok(report)
}
