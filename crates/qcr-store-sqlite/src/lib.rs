//! SQLite backend for the canonical QC record store.
//!
//! Access is synchronous: the pipeline processes one origin at a time and
//! each origin replace is a single transaction on the one connection.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::CURRENT_SCHEMA_VERSION;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
