//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, NaiveTime};
use qcr_core::{
  entry::{CanonicalEntry, IssueKind, SourceCategory, ValidationIssue},
  identity::CanonicalIdentity,
  quality::YieldClass,
  store::{CanonicalStore, EntryQuery, OriginBatch, OriginStatus, UpsertOutcome},
};

use crate::{CURRENT_SCHEMA_VERSION, SqliteStore};

fn store() -> SqliteStore { SqliteStore::open_in_memory().expect("in-memory store") }

fn entry(origin: &str, ordinal: u32, identity: Option<&str>, day: u32) -> CanonicalEntry {
  CanonicalEntry {
    source:           SourceCategory::LegacySpreadsheet,
    origin:           origin.to_string(),
    ordinal,
    work_order:       Some("12345".into()),
    customer:         Some("Acme".into()),
    entry_date:       NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
    identity:         identity.map(str::to_string),
    participants:     identity.map(str::to_string).into_iter().collect(),
    worker_token:     Some(identity.unwrap_or("??").to_string()),
    part_name:        Some("Bracket".into()),
    material:         None,
    material_size:    None,
    start_time:       NaiveTime::from_hms_opt(7, 0, 0),
    finish_time:      None,
    process_minutes:  Some(450.0),
    total_minutes:    Some(120.0),
    duration_minutes: Some(120.0),
    parts_produced:   Some(40),
    yield_class:      YieldClass::Scrap,
    yield_raw:        Some("SCRAP 2".into()),
    scrap_count:      2,
    defect_count:     0,
    department:       Some("Saws".into()),
    task_ref:         None,
    notes:            None,
  }
}

fn batch(origin: &str, entries: Vec<CanonicalEntry>) -> OriginBatch {
  OriginBatch {
    source: SourceCategory::LegacySpreadsheet,
    origin: origin.to_string(),
    location: Some(format!("/data/{origin}")),
    entries,
    issues: Vec::new(),
    dropped: 0,
    status: OriginStatus::Success,
  }
}

fn by_origin(origin: &str) -> EntryQuery {
  EntryQuery { origin: Some(origin.to_string()), ..Default::default() }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[test]
fn migrations_reach_current_version() {
  assert_eq!(store().schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn reopening_a_file_applies_nothing_new() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("qc.db");
  {
    let mut s = SqliteStore::open(&path).unwrap();
    s.replace_origin(&batch("a.xlsx", vec![entry("a.xlsx", 2, Some("A"), 1)]))
      .unwrap();
  }
  let s = SqliteStore::open(&path).unwrap();
  assert_eq!(s.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
  assert_eq!(s.count_entries(&EntryQuery::default()).unwrap(), 1);
}

// ─── Entries ─────────────────────────────────────────────────────────────────

#[test]
fn entries_round_trip() {
  let mut s = store();
  let e = entry("a.xlsx", 2, Some("Jordan Ellis"), 15);
  s.replace_origin(&batch("a.xlsx", vec![e.clone()])).unwrap();

  let stored = s.entries(&EntryQuery::default()).unwrap();
  assert_eq!(stored, vec![e]);
}

#[test]
fn replace_discards_previous_rows() {
  let mut s = store();
  s.replace_origin(&batch(
    "a.xlsx",
    vec![entry("a.xlsx", 2, Some("A"), 1), entry("a.xlsx", 3, Some("A"), 2)],
  ))
  .unwrap();

  let outcome = s
    .replace_origin(&batch("a.xlsx", vec![entry("a.xlsx", 2, Some("B"), 1)]))
    .unwrap();
  assert_eq!(outcome.removed, 2);
  assert_eq!(outcome.written, 1);

  let stored = s.entries(&by_origin("a.xlsx")).unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].identity.as_deref(), Some("B"));
}

#[test]
fn empty_replace_leaves_no_rows() {
  let mut s = store();
  s.replace_origin(&batch("File_X.xlsx", vec![entry("File_X.xlsx", 2, Some("A"), 1)]))
    .unwrap();
  s.replace_origin(&batch("File_X.xlsx", Vec::new())).unwrap();
  assert_eq!(s.count_entries(&by_origin("File_X.xlsx")).unwrap(), 0);
}

#[test]
fn replace_leaves_other_origins_alone() {
  let mut s = store();
  s.replace_origin(&batch("a.xlsx", vec![entry("a.xlsx", 2, Some("A"), 1)])).unwrap();
  s.replace_origin(&batch("b.xlsx", vec![entry("b.xlsx", 2, Some("A"), 1)])).unwrap();
  s.replace_origin(&batch("a.xlsx", Vec::new())).unwrap();
  assert_eq!(s.count_entries(&by_origin("b.xlsx")).unwrap(), 1);
}

#[test]
fn duplicate_ordinals_are_skipped_not_fatal() {
  let mut s = store();
  let outcome = s
    .replace_origin(&batch(
      "a.xlsx",
      vec![entry("a.xlsx", 2, Some("A"), 1), entry("a.xlsx", 2, Some("B"), 1)],
    ))
    .unwrap();
  assert_eq!(outcome.written, 1);
  assert_eq!(outcome.skipped, 1);

  let origins = s.list_origins(None).unwrap();
  assert_eq!(origins[0].rows_skipped, 1);
}

#[test]
fn query_by_identity_includes_joint_participants() {
  let mut s = store();
  let mut joint = entry("a.xlsx", 3, Some("A"), 2);
  joint.participants = vec!["A".into(), "B".into()];
  s.replace_origin(&batch(
    "a.xlsx",
    vec![entry("a.xlsx", 2, Some("B"), 1), joint, entry("a.xlsx", 4, None, 3)],
  ))
  .unwrap();

  let q = EntryQuery { identity: Some("B".into()), ..Default::default() };
  let hits: Vec<u32> = s.entries(&q).unwrap().iter().map(|e| e.ordinal).collect();
  assert_eq!(hits, vec![2, 3]);
}

#[test]
fn query_by_date_range_and_paging() {
  let mut s = store();
  let entries = (1..=5).map(|d| entry("a.xlsx", d + 1, Some("A"), d)).collect();
  s.replace_origin(&batch("a.xlsx", entries)).unwrap();

  let q = EntryQuery {
    date_from: NaiveDate::from_ymd_opt(2025, 7, 2),
    date_to: NaiveDate::from_ymd_opt(2025, 7, 4),
    ..Default::default()
  };
  assert_eq!(s.count_entries(&q).unwrap(), 3);

  let q = EntryQuery { limit: Some(2), offset: Some(1), ..q };
  let days: Vec<String> =
    s.entries(&q).unwrap().iter().map(|e| e.entry_date.to_string()).collect();
  assert_eq!(days, vec!["2025-07-03", "2025-07-04"]);
}

#[test]
fn worker_tokens_are_counted() {
  let mut s = store();
  s.replace_origin(&batch(
    "a.xlsx",
    vec![
      entry("a.xlsx", 2, Some("A"), 1),
      entry("a.xlsx", 3, Some("A"), 1),
      entry("a.xlsx", 4, None, 1),
    ],
  ))
  .unwrap();

  let tokens = s.worker_tokens().unwrap();
  assert_eq!(tokens[0].token, "A");
  assert_eq!(tokens[0].rows, 2);
  assert!(tokens[0].resolved);
  assert_eq!(tokens[1].token, "??");
  assert!(!tokens[1].resolved);
}

// ─── Origins and issues ──────────────────────────────────────────────────────

#[test]
fn origin_metadata_records_counts() {
  let mut s = store();
  let mut b = batch("a.xlsx", vec![entry("a.xlsx", 2, None, 1)]);
  b.dropped = 3;
  b.issues = vec![ValidationIssue::new(2, IssueKind::UnresolvedIdentity, "??")];
  s.replace_origin(&b).unwrap();

  let origins = s.list_origins(Some(SourceCategory::LegacySpreadsheet)).unwrap();
  assert_eq!(origins.len(), 1);
  let o = &origins[0];
  assert_eq!(o.rows_written, 1);
  assert_eq!(o.rows_dropped, 3);
  assert_eq!(o.unresolved, 1);
  assert_eq!(o.status, OriginStatus::Success);
  assert!(s.list_origins(Some(SourceCategory::LiveSystem)).unwrap().is_empty());

  let issues = s.validation_issues(None, Some("a.xlsx")).unwrap();
  assert_eq!(issues.len(), 1);
  assert_eq!(issues[0].issue.kind, IssueKind::UnresolvedIdentity);
}

#[test]
fn failed_origin_clears_rows_and_records_error() {
  let mut s = store();
  s.replace_origin(&batch("a.xlsx", vec![entry("a.xlsx", 2, Some("A"), 1)])).unwrap();
  s.replace_origin(&OriginBatch::failed(
    SourceCategory::LegacySpreadsheet,
    "a.xlsx",
    None,
    "no header row",
  ))
  .unwrap();

  assert_eq!(s.count_entries(&by_origin("a.xlsx")).unwrap(), 0);
  let o = &s.list_origins(None).unwrap()[0];
  assert_eq!(o.status, OriginStatus::Failed("no header row".into()));
}

#[test]
fn remove_origin_drops_everything() {
  let mut s = store();
  let mut b = batch("a.xlsx", vec![entry("a.xlsx", 2, None, 1)]);
  b.issues = vec![ValidationIssue::new(2, IssueKind::UnresolvedIdentity, "??")];
  s.replace_origin(&b).unwrap();

  let removed = s.remove_origin(SourceCategory::LegacySpreadsheet, "a.xlsx").unwrap();
  assert_eq!(removed, 1);
  assert!(s.list_origins(None).unwrap().is_empty());
  assert!(s.validation_issues(None, None).unwrap().is_empty());
}

// ─── Identities ──────────────────────────────────────────────────────────────

#[test]
fn upsert_identity_inserts_then_updates() {
  let mut s = store();
  let mut id = CanonicalIdentity::new("Jordan Ellis");
  id.role = Some("Operator".into());
  id.certified_departments = vec!["Saws".into()];
  id.primary_department = Some("Saws".into());

  assert_eq!(s.upsert_identity(&id).unwrap(), UpsertOutcome::Inserted);
  assert_eq!(s.upsert_identity(&id).unwrap(), UpsertOutcome::Unchanged);

  id.role = Some("Lead".into());
  assert_eq!(s.upsert_identity(&id).unwrap(), UpsertOutcome::Updated);

  let stored = s.get_identity("Jordan Ellis").unwrap().unwrap();
  assert_eq!(stored, id);
  assert_eq!(s.identities().unwrap().len(), 1);
  assert!(s.get_identity("Nobody").unwrap().is_none());
}

#[test]
fn upsert_identity_compares_certified_departments() {
  let mut s = store();
  let mut id = CanonicalIdentity::new("Maria Kim");
  id.certified_departments = vec!["Presses".into(), "Routers".into()];

  assert_eq!(s.upsert_identity(&id).unwrap(), UpsertOutcome::Inserted);
  assert_eq!(s.upsert_identity(&id.clone()).unwrap(), UpsertOutcome::Unchanged);

  id.certified_departments.push("Assembly".into());
  assert_eq!(s.upsert_identity(&id).unwrap(), UpsertOutcome::Updated);
  assert_eq!(s.get_identity("Maria Kim").unwrap().unwrap().certified_departments.len(), 3);
}
