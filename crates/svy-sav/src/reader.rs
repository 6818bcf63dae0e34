//! SAV file reader.
//!
//! Provides functionality to read SPSS system (.sav) files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::cursor::{ByteCursor, Endian};
use crate::error::{Result, SavError};
use crate::header::{
    DEFAULT_SYSMIS, FILE_HEADER_LEN, FileHeader, RECORD_DOCUMENTS, RECORD_EXTENSION,
    RECORD_TERMINATOR, RECORD_VALUE_LABELS, RECORD_VARIABLE, SUBTYPE_ENCODING, SUBTYPE_FLOAT_INFO,
    SUBTYPE_LONG_NAMES, ValueLabelRecord, VariableRecord, parse_encoding, parse_extension_record,
    parse_file_header, parse_float_info, parse_long_variable_names, parse_value_label_record,
    parse_variable_record,
};
use crate::types::{SavColumn, SavDataset, SavType, SavValue};

/// SAV file reader.
///
/// Reads SPSS system files with bytecode-compressed or uncompressed case
/// data, in either byte order.
pub struct SavReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> SavReader<R> {
    /// Create a new SAV reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the entire file into memory and parse it.
    pub fn read_dataset(mut self) -> Result<SavDataset> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        parse_sav_data(&data)
    }
}

impl SavReader<File> {
    /// Open a SAV file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SavError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                SavError::Io(e)
            }
        })?;
        Ok(Self::new(file))
    }
}

/// Read a SAV file from a path.
///
/// This is a convenience function that opens and reads the file.
pub fn read_sav(path: &Path) -> Result<SavDataset> {
    SavReader::open(path)?.read_dataset()
}

/// Parse SAV data from an in-memory byte buffer.
pub fn parse_sav_data(data: &[u8]) -> Result<SavDataset> {
    let header = parse_file_header(data)?;
    let mut cursor = ByteCursor::new(data, FILE_HEADER_LEN, header.endian);

    let mut raw_vars: Vec<VariableRecord> = Vec::new();
    let mut label_sets: Vec<ValueLabelRecord> = Vec::new();
    let mut long_names: Vec<(String, String)> = Vec::new();
    let mut encoding: Option<String> = None;
    let mut sysmis = DEFAULT_SYSMIS;

    loop {
        let record_start = cursor.position();
        let record_type = cursor.read_i32()?;
        match record_type {
            RECORD_VARIABLE => raw_vars.push(parse_variable_record(&mut cursor)?),
            RECORD_VALUE_LABELS => label_sets.push(parse_value_label_record(&mut cursor)?),
            RECORD_DOCUMENTS => {
                let lines = cursor.read_i32()?;
                let lines = usize::try_from(lines).map_err(|_| {
                    SavError::invalid_format(format!("document line count {lines}"))
                })?;
                cursor.skip(lines * 80)?;
            }
            RECORD_EXTENSION => {
                let record = parse_extension_record(&mut cursor)?;
                match record.subtype {
                    SUBTYPE_FLOAT_INFO => {
                        if let Some(value) = parse_float_info(record.data, header.endian) {
                            sysmis = value;
                        }
                    }
                    SUBTYPE_LONG_NAMES => {
                        long_names = parse_long_variable_names(record.data);
                    }
                    SUBTYPE_ENCODING => encoding = Some(parse_encoding(record.data)),
                    other => debug!(subtype = other, "skipping extension record"),
                }
            }
            RECORD_TERMINATOR => {
                // Terminator carries one filler word.
                cursor.read_i32()?;
                break;
            }
            other => {
                return Err(SavError::UnrecognizedRecord {
                    record_type: other,
                    offset: record_start,
                });
            }
        }
    }

    if header.nominal_case_size > 0 && header.nominal_case_size as usize != raw_vars.len() {
        warn!(
            declared = header.nominal_case_size,
            actual = raw_vars.len(),
            "header case size disagrees with the dictionary"
        );
    }

    let mut columns = build_columns(&raw_vars, &label_sets, header.endian)?;
    apply_long_names(&mut columns, &long_names);

    let rows = parse_cases(cursor, &header, &columns, sysmis)?;

    info!(
        columns = columns.len(),
        rows = rows.len(),
        compressed = header.compression != 0,
        "parsed SAV file"
    );

    Ok(SavDataset {
        product: header.product,
        file_label: if header.file_label.is_empty() {
            None
        } else {
            Some(header.file_label)
        },
        encoding,
        columns,
        rows,
    })
}

/// Build columns from the raw dictionary slots and attach value labels.
fn build_columns(
    raw_vars: &[VariableRecord],
    label_sets: &[ValueLabelRecord],
    endian: Endian,
) -> Result<Vec<SavColumn>> {
    let mut columns = Vec::new();
    // Dictionary index (1-based slot number) of each column's head slot.
    let mut slot_to_column = vec![None; raw_vars.len()];

    for (slot, record) in raw_vars.iter().enumerate() {
        if record.is_continuation() {
            continue;
        }
        let column = if record.type_code == 0 {
            SavColumn::numeric(&record.name)
        } else {
            SavColumn::string(&record.name, record.type_code as u16)
        };
        let column = match &record.label {
            Some(label) => column.with_label(label),
            None => column,
        };
        slot_to_column[slot] = Some(columns.len());
        columns.push(column);
    }

    for set in label_sets {
        for &index in &set.indexes {
            let slot = index as usize - 1;
            let column_index = slot_to_column
                .get(slot)
                .copied()
                .flatten()
                .ok_or(SavError::BadLabelIndex { index })?;
            let column = &mut columns[column_index];
            let mut labels = Vec::with_capacity(set.entries.len());
            for (value, label) in &set.entries {
                let key = match column.data_type {
                    SavType::Num => SavValue::Num(endian.f64_from(value)),
                    SavType::Str => SavValue::Str(crate::header::trimmed_text(value)),
                };
                labels.push((key, label.clone()));
            }
            column.value_labels = labels;
        }
    }

    Ok(columns)
}

/// Apply subtype-13 long names to the matching columns.
fn apply_long_names(columns: &mut [SavColumn], long_names: &[(String, String)]) {
    for (short, long) in long_names {
        match columns
            .iter_mut()
            .find(|column| column.name.eq_ignore_ascii_case(short))
        {
            Some(column) => column.name = long.clone(),
            None => warn!(short = %short, "long name record for unknown variable"),
        }
    }
}

/// One decoded 8-byte case data element.
enum Element {
    Bytes([u8; 8]),
    Number(f64),
    Sysmis,
    Blank,
}

/// Yields case data elements from the raw or bytecode-compressed stream.
struct ElementSource<'a> {
    cursor: ByteCursor<'a>,
    mode: SourceMode,
}

enum SourceMode {
    Raw,
    Bytecode {
        bias: f64,
        commands: [u8; 8],
        next: usize,
        finished: bool,
    },
}

/// Bytecode command meanings.
const CMD_PADDING: u8 = 0;
const CMD_END_OF_DATA: u8 = 252;
const CMD_LITERAL: u8 = 253;
const CMD_ALL_SPACES: u8 = 254;
const CMD_SYSMIS: u8 = 255;

impl<'a> ElementSource<'a> {
    fn raw(cursor: ByteCursor<'a>) -> Self {
        Self {
            cursor,
            mode: SourceMode::Raw,
        }
    }

    fn bytecode(cursor: ByteCursor<'a>, bias: f64) -> Self {
        Self {
            cursor,
            mode: SourceMode::Bytecode {
                bias,
                commands: [0; 8],
                next: 8,
                finished: false,
            },
        }
    }

    /// Next element, or `None` at end of data.
    fn next_element(&mut self) -> Result<Option<Element>> {
        match &mut self.mode {
            SourceMode::Raw => {
                if self.cursor.remaining() == 0 {
                    return Ok(None);
                }
                if self.cursor.remaining() < 8 {
                    return Err(SavError::invalid_format("trailing bytes in case data"));
                }
                Ok(Some(Element::Bytes(self.cursor.read_element()?)))
            }
            SourceMode::Bytecode {
                bias,
                commands,
                next,
                finished,
            } => {
                loop {
                    if *finished {
                        return Ok(None);
                    }
                    if *next == 8 {
                        if self.cursor.remaining() == 0 {
                            return Ok(None);
                        }
                        *commands = self.cursor.read_element()?;
                        *next = 0;
                    }
                    let code = commands[*next];
                    *next += 1;
                    match code {
                        CMD_PADDING => continue,
                        CMD_END_OF_DATA => {
                            *finished = true;
                            return Ok(None);
                        }
                        CMD_LITERAL => return Ok(Some(Element::Bytes(self.cursor.read_element()?))),
                        CMD_ALL_SPACES => return Ok(Some(Element::Blank)),
                        CMD_SYSMIS => return Ok(Some(Element::Sysmis)),
                        code => return Ok(Some(Element::Number(f64::from(code) - *bias))),
                    }
                }
            }
        }
    }
}

/// Parse all cases following the dictionary terminator.
fn parse_cases(
    cursor: ByteCursor<'_>,
    header: &FileHeader,
    columns: &[SavColumn],
    sysmis: f64,
) -> Result<Vec<Vec<SavValue>>> {
    let endian = header.endian;
    let mut source = if header.compression == 0 {
        ElementSource::raw(cursor)
    } else {
        ElementSource::bytecode(cursor, header.bias)
    };

    let mut rows = Vec::new();
    match header.case_count {
        Some(count) => {
            for _ in 0..count {
                let row = read_case(&mut source, columns, sysmis, endian)?.ok_or_else(|| {
                    SavError::invalid_format("case data ends before the declared case count")
                })?;
                rows.push(row);
            }
        }
        None => {
            while let Some(row) = read_case(&mut source, columns, sysmis, endian)? {
                rows.push(row);
            }
        }
    }
    Ok(rows)
}

/// Read one case; `None` when the stream ends cleanly at a case boundary.
fn read_case(
    source: &mut ElementSource<'_>,
    columns: &[SavColumn],
    sysmis: f64,
    endian: Endian,
) -> Result<Option<Vec<SavValue>>> {
    let mut values = Vec::with_capacity(columns.len());
    let mut at_boundary = true;

    for column in columns {
        match column.data_type {
            SavType::Num => {
                let Some(element) = source.next_element()? else {
                    return case_end(at_boundary);
                };
                values.push(numeric_value(&element, sysmis, endian));
            }
            SavType::Str => {
                let mut bytes = Vec::with_capacity(column.segments() * 8);
                for _ in 0..column.segments() {
                    let Some(element) = source.next_element()? else {
                        return case_end(at_boundary && bytes.is_empty());
                    };
                    bytes.extend_from_slice(&string_bytes(&element)?);
                    at_boundary = false;
                }
                let width = usize::from(column.width).min(bytes.len());
                values.push(SavValue::Str(crate::header::trimmed_text(&bytes[..width])));
            }
        }
        at_boundary = false;
    }

    Ok(Some(values))
}

fn case_end(at_boundary: bool) -> Result<Option<Vec<SavValue>>> {
    if at_boundary {
        Ok(None)
    } else {
        Err(SavError::invalid_format("truncated case data"))
    }
}

fn numeric_value(element: &Element, sysmis: f64, endian: Endian) -> SavValue {
    match element {
        Element::Bytes(bytes) => {
            let value = endian.f64_from(bytes);
            if value == sysmis {
                SavValue::Missing
            } else {
                SavValue::Num(value)
            }
        }
        Element::Number(value) => SavValue::Num(*value),
        Element::Sysmis | Element::Blank => SavValue::Missing,
    }
}

fn string_bytes(element: &Element) -> Result<[u8; 8]> {
    match element {
        Element::Bytes(bytes) => Ok(*bytes),
        Element::Blank | Element::Sysmis => Ok([b' '; 8]),
        Element::Number(_) => Err(SavError::invalid_format(
            "compressed numeric value in string data",
        )),
    }
}
