//! Error type for `qcr-sources`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("cannot read workbook {path}: {source}")]
  Workbook {
    path:   PathBuf,
    #[source]
    source: calamine::Error,
  },

  #[error("workbook has no worksheets")]
  NoSheets,

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("unsupported file type: {0:?}")]
  UnsupportedExtension(String),

  #[error("no header row with DATE and OPERATOR columns")]
  MissingHeader,

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("live database not found: {0}")]
  MissingDatabase(PathBuf),

  #[error("invalid table name: {0:?}")]
  InvalidTableName(String),

  #[error("table {0:?} does not exist")]
  MissingTable(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
