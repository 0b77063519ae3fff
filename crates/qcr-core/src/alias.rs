//! The alias table: every token known to name each canonical identity.
//!
//! Loaded once from TOML and never mutated. Each lookup rule has its own
//! reverse index so resolution is a handful of map probes.
//!
//! ```toml
//! [[identity]]
//! name     = "Jordan Ellis"
//! aliases  = ["J. Ellis"]
//! initials = ["JE"]
//! variants = ["Jordy"]
//! ```

use std::{
  collections::{BTreeMap, BTreeSet, HashMap, HashSet},
  path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One identity's entry in the alias file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityAliases {
  pub name:     String,
  /// Alternate spellings matched exactly (then case-insensitively).
  pub aliases:  Vec<String>,
  /// Short codes such as `JE`; matched after stripping dots and spaces.
  pub initials: Vec<String>,
  /// Informal first names and nicknames, matched case-insensitively.
  pub variants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AliasFile {
  #[serde(default)]
  identity: Vec<IdentityAliases>,
}

type Index = HashMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default)]
pub struct AliasTable {
  identities: BTreeMap<String, IdentityAliases>,
  exact:      Index,
  folded:     Index,
  initials:   Index,
  variants:   Index,
}

impl AliasTable {
  pub fn new(entries: impl IntoIterator<Item = IdentityAliases>) -> Result<Self> {
    let mut table = Self::default();
    for mut entry in entries {
      entry.name = entry.name.trim().to_string();
      if entry.name.is_empty() {
        return Err(Error::EmptyIdentityName);
      }
      if table.identities.contains_key(&entry.name) {
        return Err(Error::DuplicateIdentity(entry.name));
      }
      table.index(&entry);
      table.identities.insert(entry.name.clone(), entry);
    }
    Ok(table)
  }

  pub fn from_toml(text: &str) -> Result<Self> {
    let file: AliasFile = toml::from_str(text)?;
    Self::new(file.identity)
  }

  pub fn load(path: &Path) -> Result<Self> {
    Self::from_toml(&std::fs::read_to_string(path)?)
  }

  fn index(&mut self, entry: &IdentityAliases) {
    let name = &entry.name;
    let spellings =
      std::iter::once(name.as_str()).chain(entry.aliases.iter().map(String::as_str));
    for s in spellings {
      let s = collapse_whitespace(s);
      if s.is_empty() {
        continue;
      }
      insert(&mut self.folded, s.to_lowercase(), name);
      insert(&mut self.exact, s, name);
    }
    for code in &entry.initials {
      if let Some(code) = initial_code(code) {
        insert(&mut self.initials, code, name);
      }
    }
    for v in &entry.variants {
      let v = collapse_whitespace(v).to_lowercase();
      if !v.is_empty() {
        insert(&mut self.variants, v, name);
      }
    }
  }

  // ── Queries ───────────────────────────────────────────────────────────

  pub fn contains(&self, name: &str) -> bool { self.identities.contains_key(name) }

  pub fn get(&self, name: &str) -> Option<&IdentityAliases> {
    self.identities.get(name)
  }

  /// Canonical names in sorted order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.identities.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize { self.identities.len() }

  pub fn is_empty(&self) -> bool { self.identities.is_empty() }

  /// Every token the table knows for `name`: the name itself, aliases,
  /// initials and variants.
  pub fn tokens_for(&self, name: &str) -> Vec<String> {
    let Some(e) = self.identities.get(name) else {
      return Vec::new();
    };
    let mut out: Vec<String> = std::iter::once(&e.name)
      .chain(&e.aliases)
      .chain(&e.initials)
      .chain(&e.variants)
      .cloned()
      .collect();
    let mut seen = HashSet::new();
    out.retain(|t| seen.insert(t.clone()));
    out
  }

  pub fn lookup_exact(&self, token: &str) -> Vec<&str> { hits(&self.exact, token) }

  pub fn lookup_folded(&self, token: &str) -> Vec<&str> {
    hits(&self.folded, &token.to_lowercase())
  }

  pub fn lookup_initials(&self, token: &str) -> Vec<&str> {
    match initial_code(token) {
      Some(code) => hits(&self.initials, &code),
      None => Vec::new(),
    }
  }

  pub fn lookup_variant(&self, token: &str) -> Vec<&str> {
    hits(&self.variants, &token.to_lowercase())
  }
}

fn insert(index: &mut Index, key: String, name: &str) {
  index.entry(key).or_default().insert(name.to_string());
}

fn hits<'a>(index: &'a Index, key: &str) -> Vec<&'a str> {
  index
    .get(key)
    .map(|set| set.iter().map(String::as_str).collect())
    .unwrap_or_default()
}

/// Trim and collapse internal runs of whitespace to one space.
pub fn collapse_whitespace(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalise a short-initial code: dots and whitespace removed, upper-cased.
///
/// Only 1 to 4 alphabetic characters qualify; anything longer is a name, not
/// a code.
pub fn initial_code(token: &str) -> Option<String> {
  let code: String = token
    .chars()
    .filter(|c| *c != '.' && !c.is_whitespace())
    .collect();
  let len = code.chars().count();
  if (1..=4).contains(&len) && code.chars().all(char::is_alphabetic) {
    Some(code.to_uppercase())
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TABLE: &str = r#"
    [[identity]]
    name     = "Jordan Ellis"
    aliases  = ["J Ellis"]
    initials = ["JE"]
    variants = ["Jordy"]

    [[identity]]
    name     = "Jamie Evans"
    initials = ["J.E."]
  "#;

  #[test]
  fn loads_and_indexes() {
    let t = AliasTable::from_toml(TABLE).unwrap();
    assert_eq!(t.len(), 2);
    assert_eq!(t.lookup_exact("J Ellis"), vec!["Jordan Ellis"]);
    assert_eq!(t.lookup_folded("JORDAN ELLIS"), vec!["Jordan Ellis"]);
    assert_eq!(t.lookup_variant("jordy"), vec!["Jordan Ellis"]);
  }

  #[test]
  fn shared_initials_hit_both_identities() {
    let t = AliasTable::from_toml(TABLE).unwrap();
    assert_eq!(t.lookup_initials("j.e"), vec!["Jamie Evans", "Jordan Ellis"]);
  }

  #[test]
  fn duplicate_names_are_rejected() {
    let err = AliasTable::from_toml(
      "[[identity]]\nname = \"A\"\n[[identity]]\nname = \" A \"\n",
    )
    .unwrap_err();
    assert!(matches!(err, Error::DuplicateIdentity(n) if n == "A"));
  }

  #[test]
  fn empty_names_are_rejected() {
    let err = AliasTable::from_toml("[[identity]]\nname = \"  \"\n").unwrap_err();
    assert!(matches!(err, Error::EmptyIdentityName));
  }

  #[test]
  fn initial_codes() {
    assert_eq!(initial_code(" j. e. ").as_deref(), Some("JE"));
    assert_eq!(initial_code("Jordan"), None);
    assert_eq!(initial_code("J3"), None);
    assert_eq!(initial_code("."), None);
  }

  #[test]
  fn tokens_for_lists_everything() {
    let t = AliasTable::from_toml(TABLE).unwrap();
    assert_eq!(
      t.tokens_for("Jordan Ellis"),
      vec!["Jordan Ellis", "J Ellis", "JE", "Jordy"]
    );
    assert!(t.tokens_for("Nobody").is_empty());
  }

  #[test]
  fn tokens_for_drops_repeats_anywhere_in_the_list() {
    let t = AliasTable::from_toml(
      r#"
      [[identity]]
      name     = "Jo Ng"
      aliases  = ["JN", "Joey"]
      initials = ["JN"]
      variants = ["Joey"]
      "#,
    )
    .unwrap();
    assert_eq!(t.tokens_for("Jo Ng"), vec!["Jo Ng", "JN", "Joey"]);
  }
}
