//! Legacy QC sheet layout.
//!
//! One worksheet with a header row of `DATE…`, `OPERATOR`, `PART NAME`,
//! `START`, `PROCESS TIME`, `FINISH`, `TOTAL TIME`, `MATERIAL`,
//! `TOTAL PARTS`, `YIELD`, `MATERIAL SIZE`. Yield is free text such as
//! `SCRAP 3`.

use crate::{header::Header, spreadsheet::Columns};

pub(crate) fn columns(h: &Header) -> Columns {
  Columns {
    date:          h.containing("DATE"),
    worker:        h.containing("OPERATOR"),
    part_name:     h.exact(&["PART NAME"]),
    start:         h.exact(&["START"]),
    finish:        h.exact(&["FINISH"]),
    process:       h.exact(&["PROCESS TIME"]),
    total:         h.exact(&["TOTAL TIME"]),
    material:      h.exact(&["MATERIAL"]),
    material_size: h.exact(&["MATERIAL SIZE"]),
    parts:         h.exact(&["TOTAL PARTS"]),
    yield_value:   h.exact(&["YIELD"]),
    ..Default::default()
  }
}

#[cfg(test)]
mod tests {
  use qcr_core::entry::RawValue;

  use crate::{Error, Origin, SourceAdapter, SpreadsheetAdapter};

  fn write(dir: &std::path::Path, name: &str, body: &str) -> Origin {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    Origin { reference: name.to_string(), location: path }
  }

  #[test]
  fn extracts_rows_below_the_header() {
    let dir = tempfile::tempdir().unwrap();
    let origin = write(
      dir.path(),
      "Acme PO 12345.csv",
      "ACME QC,,,,,,,,,,\n\
       DATE,OPERATOR,PART NAME,START,PROCESS TIME,FINISH,TOTAL TIME,MATERIAL,TOTAL PARTS,YIELD,MATERIAL SIZE\n\
       2025-07-15,JE,Bracket,7:00 AM,7.5,3:00 PM,120,6061,40,SCRAP 2,1/4\n\
       ,,,,,,,,,,\n\
       not a date,MK,Bracket,,1,,,,,,\n\
       07/16/2025,MK,Plate,,,,,,,,\n",
    );

    let adapter = SpreadsheetAdapter::legacy(dir.path());
    let ex = adapter.extract(&origin).unwrap();
    assert_eq!(ex.rows.len(), 2);
    assert_eq!(ex.dropped, 1);

    let r = &ex.rows[0];
    assert_eq!(r.ordinal, 3);
    assert_eq!(r.worker.as_deref(), Some("JE"));
    assert_eq!(r.process_time.value, RawValue::Text("7.5".into()));
    assert_eq!(r.process_time.unit, None);
    assert_eq!(r.yield_value, RawValue::Text("SCRAP 2".into()));
    assert_eq!(r.material_size.as_deref(), Some("1/4"));
    assert_eq!(r.work_order.as_deref(), Some("12345"));
    assert_eq!(r.customer.as_deref(), Some("Acme"));
    assert_eq!(r.department, None);

    assert_eq!(ex.rows[1].ordinal, 6);
  }

  #[test]
  fn sheet_without_header_fails() {
    let dir = tempfile::tempdir().unwrap();
    let origin = write(dir.path(), "junk.csv", "a,b,c\n1,2,3\n");
    let err = SpreadsheetAdapter::legacy(dir.path()).extract(&origin).unwrap_err();
    assert!(matches!(err, Error::MissingHeader));
  }
}
