//! Crediting entries to identities.
//!
//! A single-worker entry credits its worker in full. How a joint entry is
//! shared depends on the configured [`CreditPolicy`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, entry::CanonicalEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditPolicy {
  /// Each of `n` participants receives `1/n`.
  #[default]
  EqualSplit,
  /// The first participant receives full credit, the rest none.
  PrimaryOnly,
  /// Joint entries credit nobody.
  Exclude,
}

impl CreditPolicy {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::EqualSplit => "equal_split",
      Self::PrimaryOnly => "primary_only",
      Self::Exclude => "exclude",
    }
  }

  /// The fraction of an entry with `participants` owed to `identity`.
  pub fn share(self, participants: &[String], identity: &str) -> f64 {
    let Some(pos) = participants.iter().position(|p| p == identity) else {
      return 0.0;
    };
    if participants.len() == 1 {
      return 1.0;
    }
    match self {
      Self::EqualSplit => 1.0 / participants.len() as f64,
      Self::PrimaryOnly if pos == 0 => 1.0,
      Self::PrimaryOnly | Self::Exclude => 0.0,
    }
  }
}

impl fmt::Display for CreditPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for CreditPolicy {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.replace('-', "_").as_str() {
      "equal_split" => Ok(Self::EqualSplit),
      "primary_only" => Ok(Self::PrimaryOnly),
      "exclude" => Ok(Self::Exclude),
      _ => Err(Error::UnknownCreditPolicy(s.to_string())),
    }
  }
}

/// Weighted totals credited to one identity.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Credit {
  pub identity:       String,
  /// Entries carrying any credit for the identity.
  pub entries:        usize,
  pub joint_entries:  usize,
  /// Sum of shares; a solo entry contributes 1.
  pub weight:         f64,
  pub minutes:        f64,
  pub parts_produced: f64,
}

pub fn credit_for(
  entries: &[CanonicalEntry],
  identity: &str,
  policy: CreditPolicy,
) -> Credit {
  let mut credit = Credit { identity: identity.to_string(), ..Default::default() };
  for entry in entries {
    let share = policy.share(&entry.participants, identity);
    if share == 0.0 {
      continue;
    }
    credit.entries += 1;
    if entry.is_joint() {
      credit.joint_entries += 1;
    }
    credit.weight += share;
    credit.minutes += entry.duration_minutes.unwrap_or(0.0) * share;
    credit.parts_produced += entry.parts_produced.unwrap_or(0) as f64 * share;
  }
  credit
}
