//! Roster document parser.
//!
//! The roster is a markdown list, one worker per bullet:
//!
//! ```text
//! - **Jordan Ellis** - Operator (Assembly, Saws) | [[Jordan Ellis]]
//! - **Maria Kim** - Supervisor of Presses, Routers, and Assembly
//! - **Sam Park** - Material Handler
//! ```
//!
//! Pipeline:
//!   raw &str
//!     └─ lines, skipping headings / rules / quotes / prose
//!          └─ every `-` bullet: parse_roster_line() → CanonicalIdentity
//!                                                     or rejected

use crate::{
  department::{normalize_department, title_case},
  identity::CanonicalIdentity,
};

/// Every identity found in a roster, plus the worker lines that could not be
/// parsed (1-based line number, text).
#[derive(Debug, Clone, Default)]
pub struct ParsedRoster {
  pub identities: Vec<CanonicalIdentity>,
  pub rejected:   Vec<(usize, String)>,
}

pub fn parse_roster(text: &str) -> ParsedRoster {
  let mut out = ParsedRoster::default();
  for (idx, line) in text.lines().enumerate() {
    let line = line.trim();
    if line.is_empty()
      || line.starts_with('#')
      || line.starts_with("---")
      || line.starts_with('>')
      || !line.starts_with('-')
    {
      continue;
    }
    match parse_roster_line(line) {
      Some(identity) => out.identities.push(identity),
      None => out.rejected.push((idx + 1, line.to_string())),
    }
  }
  out
}

/// Parse one `- **Name** - Role …` bullet.
pub fn parse_roster_line(line: &str) -> Option<CanonicalIdentity> {
  let line = strip_trailing_link(line.trim());
  let rest = line.strip_prefix('-')?.trim_start().strip_prefix("**")?;
  let (name, rest) = rest.split_once("**")?;
  let name = name.trim();
  let role_info = rest.trim_start().strip_prefix('-')?.trim();
  if name.is_empty() || role_info.is_empty() {
    return None;
  }

  let (role, departments) = split_role(role_info);
  let certified: Vec<String> =
    departments.iter().filter_map(|d| normalize_department(d)).collect();

  Some(CanonicalIdentity {
    name:                  name.to_string(),
    role:                  Some(title_case(&role)).filter(|r| !r.is_empty()),
    primary_department:    certified.first().cloned(),
    certified_departments: certified,
  })
}

/// Drop a trailing ` | [[wiki link]]`.
fn strip_trailing_link(line: &str) -> &str {
  if line.ends_with("]]")
    && let Some(pos) = line.rfind('|')
    && line[pos + 1..].trim_start().starts_with("[[")
  {
    return line[..pos].trim_end();
  }
  line
}

/// Split `Operator (Assembly, Saws)` or `Supervisor of X, Y, and Z` into a
/// role and its department list.
fn split_role(role_info: &str) -> (String, Vec<String>) {
  if let Some(open) = role_info.find('(')
    && let Some(len) = role_info[open + 1..].find(')')
  {
    let inner = &role_info[open + 1..open + 1 + len];
    let role = format!("{} {}", &role_info[..open], &role_info[open + 2 + len..]);
    return (role.trim().to_string(), split_list(inner));
  }

  let lower = role_info.to_lowercase();
  if let Some(pos) = lower.find(" of ") {
    let role = role_info[..pos].trim().to_string();
    let list = role_info[pos + 4..].trim();
    return (role, split_list(list));
  }

  (role_info.to_string(), Vec::new())
}

/// Split `A, B, and C` / `A and B` / `A, B` into items.
fn split_list(text: &str) -> Vec<String> {
  text
    .split(',')
    .flat_map(|part| {
      let part = part.trim();
      let part = part.strip_prefix("and ").unwrap_or(part);
      part.split(" and ").map(str::trim).collect::<Vec<_>>()
    })
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}
