//! Error types for `qcr-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("alias table is not valid TOML: {0}")]
  AliasToml(#[from] toml::de::Error),

  #[error("identity {0:?} is declared more than once in the alias table")]
  DuplicateIdentity(String),

  #[error("alias table contains an identity with an empty name")]
  EmptyIdentityName,

  #[error("unknown source category: {0:?}")]
  UnknownSourceCategory(String),

  #[error("unknown yield classification: {0:?}")]
  UnknownYieldClass(String),

  #[error("unknown credit policy: {0:?}")]
  UnknownCreditPolicy(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
