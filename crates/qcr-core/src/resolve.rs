//! Operator-token resolution.
//!
//! [`Resolver::resolve`] is a pure function of the alias table and the token.
//! Rules are tried in a fixed order and the first rule that matches anything
//! decides the outcome: one hit is a resolution, several hits are ambiguous
//! and never guessed between.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::alias::{AliasTable, collapse_whitespace};

/// Characters that join several workers into one token, e.g. `JE, MK`.
pub const COMPOSITE_SEPARATORS: &[char] = &[',', '/', '+', '-', '&', ';'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "identities", rename_all = "snake_case")]
pub enum Resolution {
  Single(String),
  /// Several workers credited on one row, in token order.
  Joint(Vec<String>),
  /// More than one identity matched; treated as unresolved.
  Ambiguous(Vec<String>),
  Unresolved,
}

impl Resolution {
  pub fn is_resolved(&self) -> bool {
    matches!(self, Self::Single(_) | Self::Joint(_))
  }

  /// The identity an entry is filed under: the sole identity, or the first
  /// participant of a joint token.
  pub fn primary(&self) -> Option<&str> {
    match self {
      Self::Single(name) => Some(name),
      Self::Joint(names) => names.first().map(String::as_str),
      _ => None,
    }
  }

  /// Every resolved identity; empty unless resolved.
  pub fn participants(&self) -> &[String] {
    match self {
      Self::Single(name) => std::slice::from_ref(name),
      Self::Joint(names) => names,
      _ => &[],
    }
  }

  pub fn mentions(&self, identity: &str) -> bool {
    self.participants().iter().any(|p| p == identity)
  }
}

#[derive(Debug, Clone)]
pub struct Resolver {
  table: AliasTable,
}

impl Resolver {
  pub fn new(table: AliasTable) -> Self { Self { table } }

  pub fn table(&self) -> &AliasTable { &self.table }

  pub fn resolve(&self, raw: &str) -> Resolution {
    let token = collapse_whitespace(raw);
    if token.is_empty() {
      return Resolution::Unresolved;
    }
    let whole = self.resolve_whole(&token);
    if whole.is_resolved() {
      return whole;
    }
    self.resolve_composite(&token).unwrap_or(whole)
  }

  /// Apply the single-token rules: exact, case-insensitive, initials, then
  /// first-name variants.
  fn resolve_whole(&self, token: &str) -> Resolution {
    let rules: [for<'t> fn(&'t AliasTable, &str) -> Vec<&'t str>; 4] = [
      AliasTable::lookup_exact,
      AliasTable::lookup_folded,
      AliasTable::lookup_initials,
      AliasTable::lookup_variant,
    ];
    for rule in rules {
      match rule(&self.table, token).as_slice() {
        [] => continue,
        [one] => return Resolution::Single(one.to_string()),
        many => {
          return Resolution::Ambiguous(
            many.iter().map(|s| s.to_string()).collect(),
          );
        }
      }
    }
    Resolution::Unresolved
  }

  /// A token that failed whole is joint when it splits into at least two
  /// segments and every segment resolves to one identity. If every segment
  /// is recognised but some are ambiguous, the whole token is ambiguous
  /// over those segments' candidates.
  fn resolve_composite(&self, token: &str) -> Option<Resolution> {
    if !token.contains(COMPOSITE_SEPARATORS) {
      return None;
    }
    let segments: Vec<&str> = token
      .split(COMPOSITE_SEPARATORS)
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .collect();
    if segments.len() < 2 {
      return None;
    }

    let mut participants: Vec<String> = Vec::new();
    let mut candidates: Vec<String> = Vec::new();
    for segment in segments {
      let names = match self.resolve_whole(segment) {
        Resolution::Single(name) => {
          if !participants.contains(&name) {
            participants.push(name);
          }
          continue;
        }
        Resolution::Ambiguous(names) => names,
        _ => return None,
      };
      for name in names {
        if !candidates.contains(&name) {
          candidates.push(name);
        }
      }
    }
    if !candidates.is_empty() {
      return Some(Resolution::Ambiguous(candidates));
    }
    match participants.len() {
      0 => None,
      1 => participants.pop().map(Resolution::Single),
      _ => Some(Resolution::Joint(participants)),
    }
  }

  /// Every token that can be credited to `identity`: the table's own tokens
  /// for it, plus each observed raw token that resolves to it directly or as
  /// a joint participant.
  pub fn attributable_tokens<'a>(
    &self,
    identity: &str,
    observed: impl IntoIterator<Item = &'a str>,
  ) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for token in self.table.tokens_for(identity) {
      if seen.insert(token.clone()) {
        out.push(token);
      }
    }
    for token in observed {
      if self.resolve(token).mentions(identity) && seen.insert(token.to_string())
      {
        out.push(token.to_string());
      }
    }
    out
  }
}
