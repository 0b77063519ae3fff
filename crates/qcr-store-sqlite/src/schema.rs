//! SQL schema for the canonical store, as a list of versioned migrations.
//!
//! `PRAGMA user_version` records how many migrations have been applied. Each
//! pending migration runs in its own transaction together with the version
//! bump, so a database is never left between versions. Never edit a shipped
//! migration; append a new one.

use rusqlite::Connection;
use tracing::info;

use crate::{Error, Result};

/// Connection-level settings, applied on every open.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Migration `i` moves the schema from version `i` to `i + 1`.
pub const MIGRATIONS: &[&str] = &[
  // 1: origins, entries, validation issues
  "
CREATE TABLE origins (
    source        TEXT NOT NULL,   -- 'legacy-spreadsheet' | 'current-spreadsheet' | 'live-system'
    origin        TEXT NOT NULL,   -- file name or live database name
    location      TEXT,
    rows_written  INTEGER NOT NULL DEFAULT 0,
    rows_dropped  INTEGER NOT NULL DEFAULT 0,
    rows_skipped  INTEGER NOT NULL DEFAULT 0,
    unresolved    INTEGER NOT NULL DEFAULT 0,
    imported_at   TEXT NOT NULL,   -- ISO 8601 UTC
    status        TEXT NOT NULL,   -- 'success' | 'failed'
    error_message TEXT,
    PRIMARY KEY (source, origin)
);

-- Entries carry no run timestamps: the same source rows always produce the
-- same bytes here.
CREATE TABLE entries (
    source           TEXT    NOT NULL,
    origin           TEXT    NOT NULL,
    ordinal          INTEGER NOT NULL,
    work_order       TEXT,
    customer         TEXT,
    entry_date       TEXT    NOT NULL,   -- YYYY-MM-DD
    identity         TEXT,
    participants     TEXT    NOT NULL DEFAULT '[]',   -- JSON array
    worker_token     TEXT,
    part_name        TEXT,
    material         TEXT,
    material_size    TEXT,
    start_time       TEXT,               -- HH:MM:SS
    finish_time      TEXT,
    process_minutes  REAL CHECK (process_minutes IS NULL OR process_minutes > 0),
    total_minutes    REAL CHECK (total_minutes IS NULL OR total_minutes > 0),
    duration_minutes REAL CHECK (duration_minutes IS NULL OR duration_minutes > 0),
    parts_produced   INTEGER CHECK (parts_produced IS NULL OR parts_produced >= 0),
    yield_class      TEXT    NOT NULL DEFAULT 'ok',
    yield_raw        TEXT,
    scrap_count      INTEGER NOT NULL DEFAULT 0,
    defect_count     INTEGER NOT NULL DEFAULT 0,
    department       TEXT,
    task_ref         TEXT,
    notes            TEXT,
    PRIMARY KEY (source, origin, ordinal),
    FOREIGN KEY (source, origin) REFERENCES origins(source, origin) ON DELETE CASCADE
);

CREATE TABLE validation_issues (
    issue_id INTEGER PRIMARY KEY AUTOINCREMENT,
    source   TEXT    NOT NULL,
    origin   TEXT    NOT NULL,
    ordinal  INTEGER NOT NULL,
    kind     TEXT    NOT NULL,
    detail   TEXT    NOT NULL,
    FOREIGN KEY (source, origin) REFERENCES origins(source, origin) ON DELETE CASCADE
);

CREATE INDEX entries_date_idx     ON entries(entry_date);
CREATE INDEX entries_identity_idx ON entries(identity);
CREATE INDEX issues_origin_idx    ON validation_issues(source, origin);
",
  // 2: identities seeded from the roster
  "
CREATE TABLE identities (
    name                  TEXT PRIMARY KEY,
    role                  TEXT,
    primary_department    TEXT,
    certified_departments TEXT NOT NULL DEFAULT '[]',   -- JSON array
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL
);

CREATE INDEX entries_department_idx ON entries(department);
",
];

pub const CURRENT_SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

pub fn schema_version(conn: &Connection) -> Result<u32> {
  Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?)
}

/// Apply every pending migration. Returns the number applied.
pub fn migrate(conn: &mut Connection) -> Result<usize> {
  conn.execute_batch(PRAGMAS)?;

  let found = schema_version(conn)?;
  if found > CURRENT_SCHEMA_VERSION {
    return Err(Error::SchemaTooNew {
      found,
      supported: CURRENT_SCHEMA_VERSION,
    });
  }

  let pending = &MIGRATIONS[found as usize..];
  for (offset, sql) in pending.iter().enumerate() {
    let version = found + offset as u32 + 1;
    let tx = conn.transaction()?;
    tx.execute_batch(sql)?;
    tx.pragma_update(None, "user_version", version)?;
    tx.commit()?;
    info!(version, "applied schema migration");
  }
  Ok(pending.len())
}
