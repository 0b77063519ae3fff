//! Current QC sheet layout.
//!
//! Data lives on the `QC Sheet` worksheet. Compared with the legacy layout it
//! adds `DEPARTMENT` and `QC REJECTED PARTS`, labels the duration columns
//! `(MINUTES)`, and records yield as a number. The `(MINUTES)` labels are not
//! trusted: the values are as mixed as in legacy sheets.

use crate::{header::Header, spreadsheet::Columns};

pub(crate) const SHEET_NAME: &str = "QC Sheet";

pub(crate) fn columns(h: &Header) -> Columns {
  Columns {
    date:          h.containing("DATE"),
    worker:        h.containing("OPERATOR"),
    department:    h.exact(&["DEPARTMENT"]),
    part_name:     h.exact(&["PART NAME", "ENTER PART NAMES", "PART NAMES"]),
    start:         h.exact(&["START"]),
    finish:        h.exact(&["FINISH"]),
    process:       h.exact(&["PROCESS TIME (MINUTES)", "PROCESS TIME"]),
    total:         h.exact(&["TOTAL TIME (MINUTES)", "TOTAL TIME"]),
    material:      h.exact(&["MATERIAL"]),
    material_size: h.exact(&["MATERIAL SIZE"]),
    parts:         h.exact(&["TOTAL PARTS"]),
    yield_value:   h.exact(&["YIELD"]),
    rejected:      h.exact(&["QC REJECTED PARTS"]),
  }
}
