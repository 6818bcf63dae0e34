//! Integration tests for the generated spreadsheet package.

use std::io::{Cursor, Read};

use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use zip::ZipArchive;

use svy_report::{DEFAULT_SHEET_NAME, write_xlsx, xlsx_bytes};

fn sample_frame() -> DataFrame {
    let columns: Vec<Column> = vec![
        Series::new("Age".into(), vec![Some(35.0f64), None, Some(58.0)]).into(),
        Series::new("City".into(), vec!["Rome", "Milan", ""]).into(),
    ];
    DataFrame::new(columns).unwrap()
}

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut content = String::new();
    part.read_to_string(&mut content).unwrap();
    content
}

#[test]
fn test_package_parts_present() {
    let bytes = xlsx_bytes(&sample_frame(), DEFAULT_SHEET_NAME).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

    for part in [
        "[Content_Types].xml",
        "_rels/.rels",
        "docProps/core.xml",
        "docProps/app.xml",
        "xl/workbook.xml",
        "xl/_rels/workbook.xml.rels",
        "xl/styles.xml",
        "xl/worksheets/sheet1.xml",
    ] {
        assert!(archive.by_name(part).is_ok(), "missing part {part}");
    }
}

#[test]
fn test_sheet_name_and_cells() {
    let bytes = xlsx_bytes(&sample_frame(), DEFAULT_SHEET_NAME).unwrap();

    let workbook = read_part(&bytes, "xl/workbook.xml");
    assert!(workbook.contains("name=\"Survey\""));

    let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
    // Header row.
    assert!(sheet.contains("<is><t>Age</t></is>"));
    assert!(sheet.contains("<is><t>City</t></is>"));
    // Numeric cell, string cell, blank for the null.
    assert!(sheet.contains("<c r=\"A2\"><v>35</v></c>"));
    assert!(sheet.contains("<is><t>Milan</t></is>"));
    assert!(!sheet.contains("r=\"A3\""));
    // Three data rows plus the header.
    assert!(sheet.contains("<row r=\"4\">"));
    assert!(!sheet.contains("<row r=\"5\">"));
}

#[test]
fn test_custom_sheet_name() {
    let bytes = xlsx_bytes(&sample_frame(), "Wave 2").unwrap();
    let workbook = read_part(&bytes, "xl/workbook.xml");
    assert!(workbook.contains("name=\"Wave 2\""));
}

#[test]
fn test_write_to_file() {
    let file = tempfile::tempfile().unwrap();
    write_xlsx(&file, &sample_frame(), DEFAULT_SHEET_NAME).unwrap();

    let mut archive = ZipArchive::new(&file).unwrap();
    assert!(archive.by_name("xl/worksheets/sheet1.xml").is_ok());
}

#[test]
fn test_empty_frame() {
    let frame = DataFrame::empty();
    let bytes = xlsx_bytes(&frame, DEFAULT_SHEET_NAME).unwrap();
    let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<row r=\"1\"></row>"));
}
