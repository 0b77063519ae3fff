//! Core types and the reconciliation engine for shop-floor QC records.
//!
//! No I/O beyond reading the alias file. The source adapters, the SQLite
//! store and the pipeline all build on these types.
//!
//! The two pieces that carry real logic live here:
//!
//! - [`resolve::Resolver`] maps raw operator tokens onto canonical identities
//!   using an immutable [`alias::AliasTable`].
//! - [`duration::normalize_to_minutes`] decides whether a bare duration was
//!   written in hours or minutes.

pub mod alias;
pub mod attribution;
pub mod date;
pub mod department;
pub mod duration;
pub mod entry;
pub mod error;
pub mod identity;
pub mod quality;
pub mod resolve;
pub mod roster;
pub mod store;

pub use error::{Error, Result};
