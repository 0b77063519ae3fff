//! Read-side reports over the canonical store.

use chrono::NaiveDate;
use qcr_core::{
  attribution::{Credit, CreditPolicy, credit_for},
  resolve::{Resolution, Resolver},
  store::{CanonicalStore, EntryQuery},
};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CreditReport {
  pub policy: CreditPolicy,
  pub credit: Credit,
  /// Raw tokens that count toward the identity.
  pub tokens: Vec<String>,
}

/// Credit `identity` with its share of every stored entry it appears on,
/// optionally limited to an inclusive date range.
pub fn credit_report<S: CanonicalStore>(
  store: &S,
  resolver: &Resolver,
  identity: &str,
  policy: CreditPolicy,
  from: Option<NaiveDate>,
  to: Option<NaiveDate>,
) -> Result<CreditReport> {
  let query = EntryQuery {
    identity: Some(identity.to_string()),
    date_from: from,
    date_to: to,
    ..Default::default()
  };
  let entries = store.entries(&query).map_err(Error::store)?;
  let observed = store.worker_tokens().map_err(Error::store)?;
  Ok(CreditReport {
    policy,
    credit: credit_for(&entries, identity, policy),
    tokens: resolver.attributable_tokens(identity, observed.iter().map(|t| t.token.as_str())),
  })
}

/// A stored worker token as the current alias table reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenReport {
  pub token:      String,
  pub rows:       usize,
  pub resolution: Resolution,
}

/// Every distinct stored token, most frequent first, re-resolved against
/// `resolver`. Useful for spotting tokens that need an alias entry.
pub fn token_report<S: CanonicalStore>(store: &S, resolver: &Resolver) -> Result<Vec<TokenReport>> {
  let tokens = store.worker_tokens().map_err(Error::store)?;
  Ok(
    tokens
      .into_iter()
      .map(|t| TokenReport {
        resolution: resolver.resolve(&t.token),
        token:      t.token,
        rows:       t.rows,
      })
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use qcr_core::{
    alias::AliasTable,
    entry::{CanonicalEntry, SourceCategory},
    store::{OriginBatch, OriginStatus},
  };
  use qcr_store_sqlite::SqliteStore;

  use super::*;

  fn resolver() -> Resolver {
    Resolver::new(
      AliasTable::from_toml(
        r#"
        [[identity]]
        name     = "Jordan Ellis"
        initials = ["JE"]

        [[identity]]
        name     = "Maria Kim"
        initials = ["MK"]
        "#,
      )
      .unwrap(),
    )
  }

  fn entry(ordinal: u32, day: u32, token: &str, participants: &[&str]) -> CanonicalEntry {
    CanonicalEntry {
      source:           SourceCategory::LegacySpreadsheet,
      origin:           "a.csv".into(),
      ordinal,
      work_order:       None,
      customer:         None,
      entry_date:       NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
      identity:         participants.first().map(|p| p.to_string()),
      participants:     participants.iter().map(|p| p.to_string()).collect(),
      worker_token:     Some(token.into()),
      part_name:        None,
      material:         None,
      material_size:    None,
      start_time:       None,
      finish_time:      None,
      process_minutes:  None,
      total_minutes:    Some(60.0),
      duration_minutes: Some(60.0),
      parts_produced:   Some(10),
      yield_class:      Default::default(),
      yield_raw:        None,
      scrap_count:      0,
      defect_count:     0,
      department:       None,
      task_ref:         None,
      notes:            None,
    }
  }

  fn store() -> SqliteStore {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store
      .replace_origin(&OriginBatch {
        source:   SourceCategory::LegacySpreadsheet,
        origin:   "a.csv".into(),
        location: None,
        entries:  vec![
          entry(2, 14, "JE", &["Jordan Ellis"]),
          entry(3, 15, "JE,MK", &["Jordan Ellis", "Maria Kim"]),
          entry(4, 16, "MK", &["Maria Kim"]),
          entry(5, 16, "night crew", &[]),
        ],
        issues:   vec![],
        dropped:  0,
        status:   OriginStatus::Success,
      })
      .unwrap();
    store
  }

  #[test]
  fn composite_entries_are_split() {
    let store = store();
    let r = resolver();
    let report =
      credit_report(&store, &r, "Jordan Ellis", CreditPolicy::EqualSplit, None, None).unwrap();
    assert_eq!(report.credit.entries, 2);
    assert_eq!(report.credit.joint_entries, 1);
    assert_eq!(report.credit.weight, 1.5);
    assert_eq!(report.credit.minutes, 90.0);
    assert!(report.tokens.contains(&"JE,MK".to_string()));

    let report =
      credit_report(&store, &r, "Maria Kim", CreditPolicy::PrimaryOnly, None, None).unwrap();
    assert_eq!(report.credit.weight, 1.0);
  }

  #[test]
  fn date_range_limits_credit() {
    let store = store();
    let r = resolver();
    let from = NaiveDate::from_ymd_opt(2025, 7, 15);
    let report =
      credit_report(&store, &r, "Jordan Ellis", CreditPolicy::EqualSplit, from, from).unwrap();
    assert_eq!(report.credit.entries, 1);
    assert_eq!(report.credit.parts_produced, 5.0);
  }

  #[test]
  fn tokens_are_re_resolved() {
    let store = store();
    let tokens = token_report(&store, &resolver()).unwrap();
    assert_eq!(tokens.len(), 4);
    let crew = tokens.iter().find(|t| t.token == "night crew").unwrap();
    assert_eq!(crew.resolution, Resolution::Unresolved);
    let joint = tokens.iter().find(|t| t.token == "JE,MK").unwrap();
    assert_eq!(
      joint.resolution,
      Resolution::Joint(vec!["Jordan Ellis".into(), "Maria Kim".into()])
    );
  }
}
