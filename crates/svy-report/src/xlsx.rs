//! XLSX (OOXML spreadsheet) output generation.
//!
//! Writes a minimal single-sheet package: content types, package and
//! workbook relationships, document properties, a stylesheet, and one
//! worksheet. Strings are written as inline strings so no shared-string
//! table is needed.

use std::io::{Cursor, Seek, Write};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use polars::prelude::{AnyValue, DataFrame};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use svy_ingest::any_to_string;

/// Sheet name used when the interface does not supply one.
pub const DEFAULT_SHEET_NAME: &str = "Survey";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_DOC_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Render the frame as a complete XLSX byte stream, ready for download.
pub fn xlsx_bytes(frame: &DataFrame, sheet_name: &str) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    write_xlsx(&mut buffer, frame, sheet_name)?;
    Ok(buffer.into_inner())
}

/// Write the frame as an XLSX package with a single named sheet.
///
/// The header row carries the column names; numeric cells are written as
/// numbers, string cells as inline strings, null cells blank.
pub fn write_xlsx<W: Write + Seek>(writer: W, frame: &DataFrame, sheet_name: &str) -> Result<()> {
    let mut package = ZipWriter::new(writer);
    let options = SimpleFileOptions::default();

    add_part(&mut package, "[Content_Types].xml", &content_types()?, options)?;
    add_part(&mut package, "_rels/.rels", &package_rels()?, options)?;
    add_part(&mut package, "docProps/core.xml", &core_properties()?, options)?;
    add_part(&mut package, "docProps/app.xml", &app_properties()?, options)?;
    add_part(&mut package, "xl/workbook.xml", &workbook(sheet_name)?, options)?;
    add_part(
        &mut package,
        "xl/_rels/workbook.xml.rels",
        &workbook_rels()?,
        options,
    )?;
    add_part(&mut package, "xl/styles.xml", &stylesheet()?, options)?;
    add_part(
        &mut package,
        "xl/worksheets/sheet1.xml",
        &worksheet(frame)?,
        options,
    )?;

    package.finish().context("finalize spreadsheet package")?;
    Ok(())
}

fn add_part<W: Write + Seek>(
    package: &mut ZipWriter<W>,
    path: &str,
    bytes: &[u8],
    options: SimpleFileOptions,
) -> Result<()> {
    package
        .start_file(path, options)
        .with_context(|| format!("start package part {path}"))?;
    package
        .write_all(bytes)
        .with_context(|| format!("write package part {path}"))?;
    Ok(())
}

fn xml_writer() -> Writer<Vec<u8>> {
    Writer::new(Vec::new())
}

fn declaration<W: Write>(xml: &mut Writer<W>) -> Result<()> {
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(())
}

fn text_element<W: Write>(xml: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(name)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn content_types() -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    declaration(&mut xml)?;

    let mut root = BytesStart::new("Types");
    root.push_attribute(("xmlns", NS_CONTENT_TYPES));
    xml.write_event(Event::Start(root))?;

    for (extension, content_type) in [
        (
            "rels",
            "application/vnd.openxmlformats-package.relationships+xml",
        ),
        ("xml", "application/xml"),
    ] {
        let mut node = BytesStart::new("Default");
        node.push_attribute(("Extension", extension));
        node.push_attribute(("ContentType", content_type));
        xml.write_event(Event::Empty(node))?;
    }

    for (part, content_type) in [
        (
            "/xl/workbook.xml",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
        ),
        (
            "/xl/worksheets/sheet1.xml",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
        ),
        (
            "/xl/styles.xml",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
        ),
        (
            "/docProps/core.xml",
            "application/vnd.openxmlformats-package.core-properties+xml",
        ),
        (
            "/docProps/app.xml",
            "application/vnd.openxmlformats-officedocument.extended-properties+xml",
        ),
    ] {
        let mut node = BytesStart::new("Override");
        node.push_attribute(("PartName", part));
        node.push_attribute(("ContentType", content_type));
        xml.write_event(Event::Empty(node))?;
    }

    xml.write_event(Event::End(BytesEnd::new("Types")))?;
    Ok(xml.into_inner())
}

fn relationships(entries: &[(&str, &str, &str)]) -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    declaration(&mut xml)?;

    let mut root = BytesStart::new("Relationships");
    root.push_attribute(("xmlns", NS_PKG_REL));
    xml.write_event(Event::Start(root))?;

    for (id, rel_type, target) in entries {
        let mut node = BytesStart::new("Relationship");
        node.push_attribute(("Id", *id));
        node.push_attribute(("Type", *rel_type));
        node.push_attribute(("Target", *target));
        xml.write_event(Event::Empty(node))?;
    }

    xml.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(xml.into_inner())
}

fn package_rels() -> Result<Vec<u8>> {
    relationships(&[
        (
            "rId1",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
            "xl/workbook.xml",
        ),
        (
            "rId2",
            "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            "docProps/core.xml",
        ),
        (
            "rId3",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties",
            "docProps/app.xml",
        ),
    ])
}

fn workbook_rels() -> Result<Vec<u8>> {
    relationships(&[
        (
            "rId1",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
            "worksheets/sheet1.xml",
        ),
        (
            "rId2",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
            "styles.xml",
        ),
    ])
}

fn core_properties() -> Result<Vec<u8>> {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut xml = xml_writer();
    declaration(&mut xml)?;

    let mut root = BytesStart::new("cp:coreProperties");
    root.push_attribute((
        "xmlns:cp",
        "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
    ));
    root.push_attribute(("xmlns:dc", "http://purl.org/dc/elements/1.1/"));
    root.push_attribute(("xmlns:dcterms", "http://purl.org/dc/terms/"));
    root.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
    xml.write_event(Event::Start(root))?;

    text_element(&mut xml, "dc:creator", "svy-report")?;
    for name in ["dcterms:created", "dcterms:modified"] {
        let mut node = BytesStart::new(name);
        node.push_attribute(("xsi:type", "dcterms:W3CDTF"));
        xml.write_event(Event::Start(node))?;
        xml.write_event(Event::Text(BytesText::new(&timestamp)))?;
        xml.write_event(Event::End(BytesEnd::new(name)))?;
    }

    xml.write_event(Event::End(BytesEnd::new("cp:coreProperties")))?;
    Ok(xml.into_inner())
}

fn app_properties() -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    declaration(&mut xml)?;

    let mut root = BytesStart::new("Properties");
    root.push_attribute((
        "xmlns",
        "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
    ));
    xml.write_event(Event::Start(root))?;
    text_element(&mut xml, "Application", "svy-report")?;
    xml.write_event(Event::End(BytesEnd::new("Properties")))?;
    Ok(xml.into_inner())
}

fn workbook(sheet_name: &str) -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    declaration(&mut xml)?;

    let mut root = BytesStart::new("workbook");
    root.push_attribute(("xmlns", NS_MAIN));
    root.push_attribute(("xmlns:r", NS_DOC_REL));
    xml.write_event(Event::Start(root))?;

    xml.write_event(Event::Start(BytesStart::new("sheets")))?;
    let mut sheet = BytesStart::new("sheet");
    sheet.push_attribute(("name", sheet_name));
    sheet.push_attribute(("sheetId", "1"));
    sheet.push_attribute(("r:id", "rId1"));
    xml.write_event(Event::Empty(sheet))?;
    xml.write_event(Event::End(BytesEnd::new("sheets")))?;

    xml.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(xml.into_inner())
}

fn stylesheet() -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    declaration(&mut xml)?;

    let mut root = BytesStart::new("styleSheet");
    root.push_attribute(("xmlns", NS_MAIN));
    xml.write_event(Event::Start(root))?;

    let mut fonts = BytesStart::new("fonts");
    fonts.push_attribute(("count", "1"));
    xml.write_event(Event::Start(fonts))?;
    xml.write_event(Event::Start(BytesStart::new("font")))?;
    let mut size = BytesStart::new("sz");
    size.push_attribute(("val", "11"));
    xml.write_event(Event::Empty(size))?;
    let mut name = BytesStart::new("name");
    name.push_attribute(("val", "Calibri"));
    xml.write_event(Event::Empty(name))?;
    xml.write_event(Event::End(BytesEnd::new("font")))?;
    xml.write_event(Event::End(BytesEnd::new("fonts")))?;

    // Two fills; the second gray125 fill is mandatory in the format.
    let mut fills = BytesStart::new("fills");
    fills.push_attribute(("count", "2"));
    xml.write_event(Event::Start(fills))?;
    for pattern in ["none", "gray125"] {
        xml.write_event(Event::Start(BytesStart::new("fill")))?;
        let mut fill = BytesStart::new("patternFill");
        fill.push_attribute(("patternType", pattern));
        xml.write_event(Event::Empty(fill))?;
        xml.write_event(Event::End(BytesEnd::new("fill")))?;
    }
    xml.write_event(Event::End(BytesEnd::new("fills")))?;

    let mut borders = BytesStart::new("borders");
    borders.push_attribute(("count", "1"));
    xml.write_event(Event::Start(borders))?;
    xml.write_event(Event::Start(BytesStart::new("border")))?;
    for side in ["left", "right", "top", "bottom", "diagonal"] {
        xml.write_event(Event::Empty(BytesStart::new(side)))?;
    }
    xml.write_event(Event::End(BytesEnd::new("border")))?;
    xml.write_event(Event::End(BytesEnd::new("borders")))?;

    for (list, name) in [("cellStyleXfs", "xf"), ("cellXfs", "xf")] {
        let mut node = BytesStart::new(list);
        node.push_attribute(("count", "1"));
        xml.write_event(Event::Start(node))?;
        let mut xf = BytesStart::new(name);
        xf.push_attribute(("numFmtId", "0"));
        xf.push_attribute(("fontId", "0"));
        xf.push_attribute(("fillId", "0"));
        xf.push_attribute(("borderId", "0"));
        xml.write_event(Event::Empty(xf))?;
        xml.write_event(Event::End(BytesEnd::new(list)))?;
    }

    xml.write_event(Event::End(BytesEnd::new("styleSheet")))?;
    Ok(xml.into_inner())
}

fn worksheet(frame: &DataFrame) -> Result<Vec<u8>> {
    let mut xml = xml_writer();
    declaration(&mut xml)?;

    let mut root = BytesStart::new("worksheet");
    root.push_attribute(("xmlns", NS_MAIN));
    xml.write_event(Event::Start(root))?;
    xml.write_event(Event::Start(BytesStart::new("sheetData")))?;

    // Header row: column names.
    let mut header = BytesStart::new("row");
    header.push_attribute(("r", "1"));
    xml.write_event(Event::Start(header))?;
    for (col_idx, name) in frame.get_column_names().iter().enumerate() {
        write_string_cell(&mut xml, &cell_reference(col_idx, 1), name.as_str())?;
    }
    xml.write_event(Event::End(BytesEnd::new("row")))?;

    // Data rows.
    let columns = frame.get_columns();
    for row_idx in 0..frame.height() {
        let row_number = row_idx + 2;
        let mut row = BytesStart::new("row");
        let row_ref = row_number.to_string();
        row.push_attribute(("r", row_ref.as_str()));
        xml.write_event(Event::Start(row))?;

        for (col_idx, column) in columns.iter().enumerate() {
            let value = column.get(row_idx).unwrap_or(AnyValue::Null);
            let reference = cell_reference(col_idx, row_number);
            match value {
                AnyValue::Null => {}
                AnyValue::String(text) => write_string_cell(&mut xml, &reference, text)?,
                AnyValue::StringOwned(ref text) => {
                    write_string_cell(&mut xml, &reference, text)?;
                }
                AnyValue::Float64(number) => {
                    write_number_cell(&mut xml, &reference, number)?;
                }
                AnyValue::Float32(number) => {
                    write_number_cell(&mut xml, &reference, f64::from(number))?;
                }
                other => write_string_cell(&mut xml, &reference, &any_to_string(other))?,
            }
        }

        xml.write_event(Event::End(BytesEnd::new("row")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("sheetData")))?;
    xml.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(xml.into_inner())
}

fn write_number_cell<W: Write>(xml: &mut Writer<W>, reference: &str, number: f64) -> Result<()> {
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference));
    xml.write_event(Event::Start(cell))?;
    text_element(xml, "v", &format!("{number}"))?;
    xml.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

fn write_string_cell<W: Write>(xml: &mut Writer<W>, reference: &str, text: &str) -> Result<()> {
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference));
    cell.push_attribute(("t", "inlineStr"));
    xml.write_event(Event::Start(cell))?;
    xml.write_event(Event::Start(BytesStart::new("is")))?;
    text_element(xml, "t", text)?;
    xml.write_event(Event::End(BytesEnd::new("is")))?;
    xml.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

/// Spreadsheet cell reference, e.g. column 0 row 1 → `A1`, column 27 → `AB`.
fn cell_reference(col_idx: usize, row_number: usize) -> String {
    let mut letters = String::new();
    let mut remainder = col_idx;
    loop {
        letters.insert(0, (b'A' + (remainder % 26) as u8) as char);
        if remainder < 26 {
            break;
        }
        remainder = remainder / 26 - 1;
    }
    format!("{letters}{row_number}")
}
