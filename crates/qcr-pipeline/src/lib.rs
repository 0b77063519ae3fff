//! The reconciliation pipeline.
//!
//! For each source category: discover origins, then for each origin extract
//! rows, normalise them into canonical entries and replace the origin's
//! previous rows in the store in one atomic write. A failing origin is
//! recorded and skipped; a failing store aborts the run.

pub mod config;
pub mod error;
pub mod normalize;
pub mod report;
pub mod roster;
pub mod run;

pub use config::ReconConfig;
pub use error::{Error, Result};
pub use normalize::Normalizer;
pub use run::{OriginReport, Pipeline, RunState, RunSummary};
pub use report::{CreditReport, TokenReport, credit_report, token_report};
pub use roster::{RosterReport, seed_roster};
