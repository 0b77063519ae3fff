//! Intermediate rows to canonical entries.
//!
//! Per row:
//!   IntermediateRow
//!     ├─ date      → DateWindow          (out of window: row dropped)
//!     ├─ worker    → Resolver + roster   (unresolved: row kept, issue raised)
//!     ├─ durations → normalize_to_minutes
//!     ├─ parts     → parse_count         (invalid: null, issue raised)
//!     ├─ yield     → read_yield
//!     └─ department: column, else inferred, else roster
//!   → CanonicalEntry

use std::collections::{HashMap, HashSet};

use qcr_core::{
  date::{DateOutcome, DateWindow, normalize_date, parse_time_of_day},
  department::{infer_department, normalize_department},
  duration::minutes_between_times,
  entry::{CanonicalEntry, IntermediateRow, IssueKind, SourceCategory, ValidationIssue},
  identity::CanonicalIdentity,
  quality::{parse_count, read_yield},
  resolve::{Resolution, Resolver},
};
use tracing::debug;

/// What became of one intermediate row.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
  Entry {
    entry:  Box<CanonicalEntry>,
    issues: Vec<ValidationIssue>,
  },
  /// The row has no usable date and is only counted.
  Dropped,
}

pub struct Normalizer<'a> {
  resolver:    &'a Resolver,
  window:      DateWindow,
  /// Canonical identity names. Empty means no roster has been seeded and
  /// any alias-table identity is accepted.
  roster:      HashSet<String>,
  /// Identity name to roster primary department.
  departments: HashMap<String, String>,
}

impl<'a> Normalizer<'a> {
  pub fn new(resolver: &'a Resolver, window: DateWindow) -> Self {
    Self {
      resolver,
      window,
      roster: HashSet::new(),
      departments: HashMap::new(),
    }
  }

  /// Only credit identities on the roster, and use roster departments as
  /// the last department fallback.
  pub fn with_roster(mut self, identities: &[CanonicalIdentity]) -> Self {
    self.roster = identities.iter().map(|i| i.name.clone()).collect();
    self.departments = identities
      .iter()
      .filter_map(|i| Some((i.name.clone(), i.primary_department.clone()?)))
      .collect();
    self
  }

  pub fn normalize(
    &self,
    source: SourceCategory,
    origin: &str,
    row: IntermediateRow,
  ) -> Normalized {
    let ordinal = row.ordinal;
    let entry_date = match normalize_date(&row.date, &self.window) {
      DateOutcome::Valid(d) => d,
      DateOutcome::OutOfWindow(d) => {
        debug!(origin, ordinal, %d, "date outside plausible window");
        return Normalized::Dropped;
      }
      DateOutcome::Unparseable => {
        debug!(origin, ordinal, "date unparseable");
        return Normalized::Dropped;
      }
    };

    let mut issues = Vec::new();

    let resolution = match row.worker.as_deref() {
      Some(token) => {
        let (resolution, issue) = self.resolve(token);
        issues.extend(issue.map(|(kind, detail)| ValidationIssue::new(ordinal, kind, detail)));
        resolution
      }
      None => Resolution::Unresolved,
    };
    let identity = resolution.primary().map(str::to_string);

    let start_time = parse_time_of_day(&row.start_time);
    let finish_time = parse_time_of_day(&row.finish_time);
    let process_minutes = row.process_time.to_minutes();
    let mut total_minutes = row.total_time.to_minutes();
    if process_minutes.is_none()
      && total_minutes.is_none()
      && let (Some(s), Some(f)) = (start_time, finish_time)
    {
      total_minutes = minutes_between_times(s, f);
    }
    let duration_minutes = total_minutes.or(process_minutes);

    let parts_produced = match parse_count(&row.parts) {
      Some(Ok(n)) => Some(n),
      Some(Err(e)) => {
        issues.push(ValidationIssue::new(
          ordinal,
          IssueKind::InvalidPartsCount,
          e.to_string(),
        ));
        None
      }
      None => None,
    };

    let quality = read_yield(
      &row.yield_value,
      &row.rejected_parts,
      &row.scrap_count,
      &row.defect_count,
    );

    let department = row
      .department
      .as_deref()
      .and_then(normalize_department)
      .or_else(|| infer_department(row.worker.as_deref(), row.part_name.as_deref()))
      .or_else(|| {
        identity
          .as_deref()
          .and_then(|name| self.departments.get(name).cloned())
      });

    let entry = CanonicalEntry {
      source,
      origin: origin.to_string(),
      ordinal,
      work_order: row.work_order,
      customer: row.customer,
      entry_date,
      identity,
      participants: resolution.participants().to_vec(),
      worker_token: row.worker,
      part_name: row.part_name,
      material: row.material,
      material_size: row.material_size,
      start_time,
      finish_time,
      process_minutes,
      total_minutes,
      duration_minutes,
      parts_produced,
      yield_class: quality.class,
      yield_raw: quality.raw,
      scrap_count: quality.scrap_count,
      defect_count: quality.defect_count,
      department,
      task_ref: row.task_ref,
      notes: row.notes,
    };
    Normalized::Entry { entry: Box::new(entry), issues }
  }

  /// Resolve a worker token, demoting identities missing from the roster to
  /// unresolved.
  fn resolve(&self, token: &str) -> (Resolution, Option<(IssueKind, String)>) {
    match self.resolver.resolve(token) {
      Resolution::Unresolved => (
        Resolution::Unresolved,
        Some((IssueKind::UnresolvedIdentity, format!("{token:?} matches no identity"))),
      ),
      Resolution::Ambiguous(candidates) => {
        let detail = format!("{token:?} matches {}", candidates.join(", "));
        (Resolution::Ambiguous(candidates), Some((IssueKind::AmbiguousIdentity, detail)))
      }
      resolved => {
        let missing: Vec<&str> = resolved
          .participants()
          .iter()
          .map(String::as_str)
          .filter(|name| !self.roster.is_empty() && !self.roster.contains(*name))
          .collect();
        if missing.is_empty() {
          return (resolved, None);
        }
        let detail = format!("{token:?} resolves to {}, not on the roster", missing.join(", "));
        (Resolution::Unresolved, Some((IssueKind::UnresolvedIdentity, detail)))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use qcr_core::{
    alias::AliasTable,
    duration::RawDuration,
    entry::RawValue,
    quality::YieldClass,
  };

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
        variants = ["Mar"]

        [[identity]]
        name     = "Marcus Kane"
        initials = ["MKA"]
        variants = ["Mar"]
        "#,
      )
      .unwrap(),
    )
  }

  fn row(worker: &str) -> IntermediateRow {
    IntermediateRow {
      ordinal: 3,
      worker: Some(worker.to_string()),
      date: RawValue::Text("2025-07-15".into()),
      ..Default::default()
    }
  }

  fn entry(n: Normalized) -> (CanonicalEntry, Vec<ValidationIssue>) {
    match n {
      Normalized::Entry { entry, issues } => (*entry, issues),
      Normalized::Dropped => panic!("row dropped"),
    }
  }

  #[test]
  fn hours_become_minutes_and_identity_resolves() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let mut raw = row("JE");
    raw.process_time = RawDuration::untagged(RawValue::Number(7.5));
    raw.total_time = RawDuration::untagged(RawValue::Number(120.0));

    let (e, issues) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", raw));
    assert!(issues.is_empty());
    assert_eq!(e.entry_date, NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
    assert_eq!(e.identity.as_deref(), Some("Jordan Ellis"));
    assert_eq!(e.worker_token.as_deref(), Some("JE"));
    assert_eq!(e.process_minutes, Some(450.0));
    assert_eq!(e.total_minutes, Some(120.0));
    assert_eq!(e.duration_minutes, Some(120.0));
  }

  #[test]
  fn process_time_stands_in_for_missing_total() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let mut raw = row("JE");
    raw.process_time = RawDuration::untagged(RawValue::Number(7.5));
    let (e, _) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", raw));
    assert_eq!(e.duration_minutes, Some(450.0));
  }

  #[test]
  fn times_of_day_fill_in_missing_durations() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let mut raw = row("JE");
    raw.start_time = RawValue::Text("7:00 AM".into());
    raw.finish_time = RawValue::Text("9:30 AM".into());
    let (e, _) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", raw));
    assert_eq!(e.total_minutes, Some(150.0));
    assert_eq!(e.duration_minutes, Some(150.0));
  }

  #[test]
  fn serial_dates_before_the_window_are_dropped() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let mut raw = row("JE");
    raw.date = RawValue::Number(1.0);
    assert_eq!(
      n.normalize(SourceCategory::CurrentSpreadsheet, "a.xlsx", raw),
      Normalized::Dropped
    );
  }

  #[test]
  fn unparseable_and_out_of_window_dates_drop_alike() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    for date in ["not a date", "1899-06-01", "2101-01-01"] {
      let mut raw = row("JE");
      raw.date = RawValue::Text(date.into());
      assert_eq!(
        n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", raw),
        Normalized::Dropped,
        "{date:?}"
      );
    }
  }

  #[test]
  fn unresolved_tokens_are_kept_with_an_issue() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let (e, issues) =
      entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", row("Night shift")));
    assert_eq!(e.identity, None);
    assert!(e.participants.is_empty());
    assert_eq!(e.worker_token.as_deref(), Some("Night shift"));
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::UnresolvedIdentity);
  }

  #[test]
  fn ambiguous_tokens_are_not_guessed() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let (e, issues) =
      entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", row("mar")));
    assert_eq!(e.identity, None);
    assert_eq!(issues[0].kind, IssueKind::AmbiguousIdentity);
    assert!(issues[0].detail.contains("Marcus Kane"));
  }

  #[test]
  fn composite_with_ambiguous_segment_is_not_credited() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let (e, issues) =
      entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", row("Mar, JE")));
    assert_eq!(e.identity, None);
    assert!(e.participants.is_empty());
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::AmbiguousIdentity);
  }

  #[test]
  fn identities_off_the_roster_are_unresolved() {
    let r = resolver();
    let roster = [CanonicalIdentity::new("Jordan Ellis"), CanonicalIdentity::new("Marcus Kane")];
    let n = Normalizer::new(&r, DateWindow::default()).with_roster(&roster);

    let (e, issues) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", row("MK")));
    assert_eq!(e.identity, None);
    assert!(e.participants.is_empty());
    assert_eq!(e.worker_token.as_deref(), Some("MK"));
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::UnresolvedIdentity);
    assert!(issues[0].detail.contains("Maria Kim"), "{}", issues[0].detail);

    let (e, _) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", row("JE,MK")));
    assert_eq!(e.identity, None);

    let (e, issues) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", row("JE")));
    assert_eq!(e.identity.as_deref(), Some("Jordan Ellis"));
    assert!(issues.is_empty());
  }

  #[test]
  fn blank_worker_raises_nothing_here() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let raw = IntermediateRow { worker: None, ..row("") };
    let (e, issues) = entry(n.normalize(SourceCategory::LiveSystem, "live.db", raw));
    assert_eq!(e.identity, None);
    assert!(issues.is_empty());
  }

  #[test]
  fn composite_tokens_become_joint_entries() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let (e, _) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", row("JE,MK")));
    assert_eq!(e.identity.as_deref(), Some("Jordan Ellis"));
    assert_eq!(e.participants, vec!["Jordan Ellis", "Maria Kim"]);
    assert!(e.is_joint());
  }

  #[test]
  fn negative_parts_are_nulled_with_an_issue() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let mut raw = row("JE");
    raw.parts = RawValue::Number(-4.0);
    let (e, issues) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", raw));
    assert_eq!(e.parts_produced, None);
    assert_eq!(issues[0].kind, IssueKind::InvalidPartsCount);
  }

  #[test]
  fn yield_text_is_classified() {
    let r = resolver();
    let n = Normalizer::new(&r, DateWindow::default());
    let mut raw = row("JE");
    raw.yield_value = RawValue::Text("SCRAP 3".into());
    let (e, _) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", raw));
    assert_eq!(e.yield_class, YieldClass::Scrap);
    assert_eq!(e.scrap_count, 3);
    assert_eq!(e.yield_raw.as_deref(), Some("SCRAP 3"));
  }

  #[test]
  fn department_falls_back_to_the_roster() {
    let r = resolver();
    let roster = [CanonicalIdentity {
      primary_department: Some("Presses".into()),
      ..CanonicalIdentity::new("Maria Kim")
    }];
    let n = Normalizer::new(&r, DateWindow::default()).with_roster(&roster);

    let (e, _) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", row("MK")));
    assert_eq!(e.department.as_deref(), Some("Presses"));

    let mut raw = row("MK");
    raw.part_name = Some("Bracket assy".into());
    let (e, _) = entry(n.normalize(SourceCategory::LegacySpreadsheet, "a.csv", raw));
    assert_eq!(e.department.as_deref(), Some("Assembly"));

    let mut raw = row("MK");
    raw.department = Some("saws".into());
    let (e, _) = entry(n.normalize(SourceCategory::CurrentSpreadsheet, "a.xlsx", raw));
    assert_eq!(e.department.as_deref(), Some("Saws"));
  }
}
