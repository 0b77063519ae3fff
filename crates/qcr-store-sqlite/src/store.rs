//! [`SqliteStore`]: the SQLite implementation of [`CanonicalStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension as _, params, types::Value};
use tracing::{debug, warn};

use qcr_core::{
  entry::{CanonicalEntry, SourceCategory},
  identity::CanonicalIdentity,
  store::{
    CanonicalStore, EntryQuery, OriginBatch, OriginRecord, ReplaceOutcome, StoredIssue,
    TokenCount, UpsertOutcome,
  },
};

use crate::{
  Result,
  encode::{
    ENTRY_COLUMNS, RawEntry, RawIdentity, RawIssue, RawOrigin, encode_date, encode_dt,
    encode_list, encode_time,
  },
  schema,
};

const INSERT_ENTRY: &str = "INSERT INTO entries (
    source, origin, ordinal, work_order, customer, entry_date, identity,
    participants, worker_token, part_name, material, material_size,
    start_time, finish_time, process_minutes, total_minutes, duration_minutes,
    parts_produced, yield_class, yield_raw, scrap_count, defect_count,
    department, task_ref, notes
  ) VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
    ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25
  )";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A canonical QC record store backed by a single SQLite file.
pub struct SqliteStore {
  conn: Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and apply pending migrations.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::init(Connection::open(path)?)
  }

  /// Open an in-memory store, useful for testing.
  pub fn open_in_memory() -> Result<Self> { Self::init(Connection::open_in_memory()?) }

  fn init(mut conn: Connection) -> Result<Self> {
    schema::migrate(&mut conn)?;
    Ok(Self { conn })
  }

  pub fn schema_version(&self) -> Result<u32> { schema::schema_version(&self.conn) }
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation
  )
}

fn insert_entry(
  stmt: &mut rusqlite::CachedStatement<'_>,
  batch: &OriginBatch,
  e: &CanonicalEntry,
) -> Result<()> {
  stmt.execute(params![
    batch.source.as_str(),
    batch.origin,
    e.ordinal,
    e.work_order,
    e.customer,
    encode_date(e.entry_date),
    e.identity,
    encode_list(&e.participants)?,
    e.worker_token,
    e.part_name,
    e.material,
    e.material_size,
    e.start_time.map(encode_time),
    e.finish_time.map(encode_time),
    e.process_minutes,
    e.total_minutes,
    e.duration_minutes,
    e.parts_produced,
    e.yield_class.as_str(),
    e.yield_raw,
    e.scrap_count,
    e.defect_count,
    e.department,
    e.task_ref,
    e.notes,
  ])?;
  Ok(())
}

/// Build the `WHERE` clause and parameters for an [`EntryQuery`].
fn entry_filter(query: &EntryQuery) -> (String, Vec<Value>) {
  let mut clauses: Vec<&str> = Vec::new();
  let mut values: Vec<Value> = Vec::new();

  if let Some(from) = query.date_from {
    clauses.push("entry_date >= ?");
    values.push(Value::Text(encode_date(from)));
  }
  if let Some(to) = query.date_to {
    clauses.push("entry_date <= ?");
    values.push(Value::Text(encode_date(to)));
  }
  if let Some(identity) = &query.identity {
    clauses.push(
      "(identity = ? OR EXISTS (SELECT 1 FROM json_each(entries.participants) WHERE value = ?))",
    );
    values.push(Value::Text(identity.clone()));
    values.push(Value::Text(identity.clone()));
  }
  if let Some(department) = &query.department {
    clauses.push("department = ?");
    values.push(Value::Text(department.clone()));
  }
  if let Some(source) = query.source {
    clauses.push("source = ?");
    values.push(Value::Text(source.as_str().to_string()));
  }
  if let Some(origin) = &query.origin {
    clauses.push("origin = ?");
    values.push(Value::Text(origin.clone()));
  }

  let sql = if clauses.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", clauses.join(" AND "))
  };
  (sql, values)
}

// ─── CanonicalStore impl ─────────────────────────────────────────────────────

impl CanonicalStore for SqliteStore {
  type Error = crate::Error;

  // ── Entries ───────────────────────────────────────────────────────────────

  fn replace_origin(&mut self, batch: &OriginBatch) -> Result<ReplaceOutcome> {
    let source = batch.source.as_str();
    let tx = self.conn.transaction()?;

    tx.execute(
      "INSERT INTO origins (source, origin, location, imported_at, status, error_message)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
       ON CONFLICT (source, origin) DO UPDATE SET
         location      = excluded.location,
         imported_at   = excluded.imported_at,
         status        = excluded.status,
         error_message = excluded.error_message",
      params![
        source,
        batch.origin,
        batch.location,
        encode_dt(Utc::now()),
        batch.status.as_str(),
        batch.status.error(),
      ],
    )?;

    let removed = tx.execute(
      "DELETE FROM entries WHERE source = ?1 AND origin = ?2",
      params![source, batch.origin],
    )?;
    tx.execute(
      "DELETE FROM validation_issues WHERE source = ?1 AND origin = ?2",
      params![source, batch.origin],
    )?;

    let mut outcome = ReplaceOutcome { removed, ..Default::default() };
    let mut unresolved = 0usize;
    {
      let mut stmt = tx.prepare_cached(INSERT_ENTRY)?;
      for entry in &batch.entries {
        match insert_entry(&mut stmt, batch, entry) {
          Ok(()) => {
            outcome.written += 1;
            if entry.identity.is_none() {
              unresolved += 1;
            }
          }
          Err(crate::Error::Database(e)) if is_constraint_violation(&e) => {
            warn!(
              origin = %batch.origin,
              ordinal = entry.ordinal,
              error = %e,
              "skipping row rejected by store constraint"
            );
            outcome.skipped += 1;
          }
          Err(e) => return Err(e),
        }
      }

      let mut stmt = tx.prepare_cached(
        "INSERT INTO validation_issues (source, origin, ordinal, kind, detail)
         VALUES (?1, ?2, ?3, ?4, ?5)",
      )?;
      for issue in &batch.issues {
        stmt.execute(params![
          source,
          batch.origin,
          issue.ordinal,
          issue.kind.as_str(),
          issue.detail,
        ])?;
      }
    }

    tx.execute(
      "UPDATE origins
       SET rows_written = ?3, rows_dropped = ?4, rows_skipped = ?5, unresolved = ?6
       WHERE source = ?1 AND origin = ?2",
      params![
        source,
        batch.origin,
        outcome.written as i64,
        batch.dropped as i64,
        outcome.skipped as i64,
        unresolved as i64,
      ],
    )?;
    tx.commit()?;

    debug!(
      origin = %batch.origin,
      removed = outcome.removed,
      written = outcome.written,
      "replaced origin"
    );
    Ok(outcome)
  }

  fn remove_origin(&mut self, source: SourceCategory, origin: &str) -> Result<usize> {
    let tx = self.conn.transaction()?;
    let removed = tx.execute(
      "DELETE FROM entries WHERE source = ?1 AND origin = ?2",
      params![source.as_str(), origin],
    )?;
    tx.execute(
      "DELETE FROM validation_issues WHERE source = ?1 AND origin = ?2",
      params![source.as_str(), origin],
    )?;
    tx.execute(
      "DELETE FROM origins WHERE source = ?1 AND origin = ?2",
      params![source.as_str(), origin],
    )?;
    tx.commit()?;
    Ok(removed)
  }

  fn entries(&self, query: &EntryQuery) -> Result<Vec<CanonicalEntry>> {
    let (filter, mut values) = entry_filter(query);
    let mut sql = format!(
      "SELECT {ENTRY_COLUMNS} FROM entries{filter} ORDER BY source, origin, ordinal"
    );
    if query.limit.is_some() || query.offset.is_some() {
      sql.push_str(" LIMIT ? OFFSET ?");
      values.push(Value::Integer(query.limit.map_or(-1, |l| l as i64)));
      values.push(Value::Integer(query.offset.unwrap_or(0) as i64));
    }

    let mut stmt = self.conn.prepare(&sql)?;
    let raws = stmt
      .query_map(rusqlite::params_from_iter(values), RawEntry::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  fn count_entries(&self, query: &EntryQuery) -> Result<usize> {
    let (filter, values) = entry_filter(query);
    let n: i64 = self.conn.query_row(
      &format!("SELECT COUNT(*) FROM entries{filter}"),
      rusqlite::params_from_iter(values),
      |r| r.get(0),
    )?;
    Ok(n as usize)
  }

  fn worker_tokens(&self) -> Result<Vec<TokenCount>> {
    let mut stmt = self.conn.prepare(
      "SELECT worker_token, COUNT(*), MAX(identity IS NOT NULL)
       FROM entries
       WHERE worker_token IS NOT NULL
       GROUP BY worker_token
       ORDER BY COUNT(*) DESC, worker_token",
    )?;
    let rows = stmt
      .query_map([], |row| {
        Ok(TokenCount {
          token:    row.get(0)?,
          rows:     row.get::<_, i64>(1)? as usize,
          resolved: row.get(2)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  }

  // ── Origins ───────────────────────────────────────────────────────────────

  fn list_origins(&self, source: Option<SourceCategory>) -> Result<Vec<OriginRecord>> {
    let mut stmt = self.conn.prepare(
      "SELECT source, origin, location, rows_written, rows_dropped, rows_skipped,
              unresolved, imported_at, status, error_message
       FROM origins
       WHERE ?1 IS NULL OR source = ?1
       ORDER BY source, origin",
    )?;
    let raws = stmt
      .query_map(params![source.map(SourceCategory::as_str)], RawOrigin::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawOrigin::into_origin).collect()
  }

  fn validation_issues(
    &self,
    source: Option<SourceCategory>,
    origin: Option<&str>,
  ) -> Result<Vec<StoredIssue>> {
    let mut stmt = self.conn.prepare(
      "SELECT source, origin, ordinal, kind, detail
       FROM validation_issues
       WHERE (?1 IS NULL OR source = ?1) AND (?2 IS NULL OR origin = ?2)
       ORDER BY source, origin, ordinal, issue_id",
    )?;
    let raws = stmt
      .query_map(params![source.map(SourceCategory::as_str), origin], |row| {
        Ok(RawIssue {
          source:  row.get(0)?,
          origin:  row.get(1)?,
          ordinal: row.get(2)?,
          kind:    row.get(3)?,
          detail:  row.get(4)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawIssue::into_issue).collect()
  }

  // ── Identities ────────────────────────────────────────────────────────────

  fn upsert_identity(&mut self, identity: &CanonicalIdentity) -> Result<UpsertOutcome> {
    let certified = encode_list(&identity.certified_departments)?;
    let now = encode_dt(Utc::now());
    let tx = self.conn.transaction()?;

    let existing = tx
      .query_row(
        "SELECT name, role, primary_department, certified_departments
         FROM identities WHERE name = ?1",
        params![identity.name],
        |row| {
          Ok(RawIdentity {
            name:                  row.get(0)?,
            role:                  row.get(1)?,
            primary_department:    row.get(2)?,
            certified_departments: row.get(3)?,
          })
        },
      )
      .optional()?
      .map(RawIdentity::into_identity)
      .transpose()?;

    let outcome = match existing {
      None => {
        tx.execute(
          "INSERT INTO identities
             (name, role, primary_department, certified_departments, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![
            identity.name,
            identity.role,
            identity.primary_department,
            certified,
            now,
          ],
        )?;
        UpsertOutcome::Inserted
      }
      Some(current) if current == *identity => UpsertOutcome::Unchanged,
      Some(_) => {
        tx.execute(
          "UPDATE identities
           SET role = ?2, primary_department = ?3, certified_departments = ?4,
               updated_at = ?5
           WHERE name = ?1",
          params![
            identity.name,
            identity.role,
            identity.primary_department,
            certified,
            now,
          ],
        )?;
        UpsertOutcome::Updated
      }
    };
    tx.commit()?;
    Ok(outcome)
  }

  fn get_identity(&self, name: &str) -> Result<Option<CanonicalIdentity>> {
    let raw = self
      .conn
      .query_row(
        "SELECT name, role, primary_department, certified_departments
         FROM identities WHERE name = ?1",
        params![name],
        |row| {
          Ok(RawIdentity {
            name:                  row.get(0)?,
            role:                  row.get(1)?,
            primary_department:    row.get(2)?,
            certified_departments: row.get(3)?,
          })
        },
      )
      .optional()?;
    raw.map(RawIdentity::into_identity).transpose()
  }

  fn identities(&self) -> Result<Vec<CanonicalIdentity>> {
    let mut stmt = self.conn.prepare(
      "SELECT name, role, primary_department, certified_departments
       FROM identities ORDER BY name",
    )?;
    let raws = stmt
      .query_map([], |row| {
        Ok(RawIdentity {
          name:                  row.get(0)?,
          role:                  row.get(1)?,
          primary_department:    row.get(2)?,
          certified_departments: row.get(3)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawIdentity::into_identity).collect()
  }
}
