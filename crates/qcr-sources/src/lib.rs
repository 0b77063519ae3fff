//! Source adapters for the three generations of QC record keeping.
//!
//! Each adapter discovers its origins (spreadsheet files, or the live
//! operational database) and extracts [`IntermediateRow`]s from them. Parsing
//! here is structural only: tokens stay unresolved, durations stay in
//! whatever unit the source used.
//!
//! [`IntermediateRow`]: qcr_core::entry::IntermediateRow

mod adapter;
mod current;
mod filename;
mod grid;
mod header;
mod legacy;
mod live;
mod spreadsheet;

pub mod error;

pub use adapter::{Extraction, Origin, SourceAdapter};
pub use error::{Error, Result};
pub use filename::{FileInfo, parse_filename};
pub use grid::{Grid, load_grid};
pub use live::{DEFAULT_LIVE_TABLE, LiveSystemAdapter};
pub use spreadsheet::{Layout, SpreadsheetAdapter};
