//! File header record handling.
//!
//! The file header is the fixed 176-byte block opening every SAV file.
//!
//! # Structure
//!
//! | Offset | Length | Field             | Description                     |
//! |--------|--------|-------------------|---------------------------------|
//! | 0-3    | 4      | rec_type          | `$FL2` magic (`$FL3` = zsav)    |
//! | 4-63   | 60     | prod_name         | Writing product                 |
//! | 64-67  | 4      | layout_code       | 2 or 3; detects byte order      |
//! | 68-71  | 4      | nominal_case_size | 8-byte elements per case        |
//! | 72-75  | 4      | compression       | 0 none, 1 bytecode, 2 zlib      |
//! | 76-79  | 4      | weight_index      | Weight variable, 0 = none       |
//! | 80-83  | 4      | ncases            | Case count, -1 = unknown        |
//! | 84-91  | 8      | bias              | Compression bias, normally 100  |
//! | 92-100 | 9      | creation_date     | `dd mmm yy`                     |
//! | 101-108| 8      | creation_time     | `hh:mm:ss`                      |
//! | 109-172| 64     | file_label        | Free text                       |
//! | 173-175| 3      | padding           |                                 |

use crate::cursor::{ByteCursor, Endian};
use crate::error::{Result, SavError};

use super::trimmed_text;

/// Total file header length in bytes.
pub const FILE_HEADER_LEN: usize = 176;

/// Magic word of an uncompressed or bytecode-compressed file.
pub const MAGIC: &[u8; 4] = b"$FL2";

/// Magic word of a zlib-compressed (`.zsav`) file.
pub const MAGIC_ZSAV: &[u8; 4] = b"$FL3";

/// No case-data compression.
pub const COMPRESSION_NONE: i32 = 0;
/// Bytecode case-data compression.
pub const COMPRESSION_BYTECODE: i32 = 1;
/// Zlib case-data compression (not supported).
pub const COMPRESSION_ZLIB: i32 = 2;

/// System-missing value used when the file carries no float-info record.
pub const DEFAULT_SYSMIS: f64 = -f64::MAX;

/// Parsed file header.
#[derive(Debug, Clone)]
pub struct FileHeader {
    /// Writing product string.
    pub product: String,
    /// Detected byte order.
    pub endian: Endian,
    /// Declared 8-byte elements per case.
    pub nominal_case_size: i32,
    /// Compression code.
    pub compression: i32,
    /// Dictionary index of the weight variable, 0 when unweighted.
    pub weight_index: i32,
    /// Declared case count; `None` when the writer did not know it.
    pub case_count: Option<u64>,
    /// Compression bias.
    pub bias: f64,
    /// Creation date string.
    pub creation_date: String,
    /// Creation time string.
    pub creation_time: String,
    /// File label.
    pub file_label: String,
}

/// Parse the 176-byte file header, detecting byte order from the layout
/// code word.
pub fn parse_file_header(data: &[u8]) -> Result<FileHeader> {
    if data.len() < FILE_HEADER_LEN {
        return Err(SavError::invalid_format("file too small for header"));
    }

    let magic = &data[0..4];
    if magic == MAGIC_ZSAV {
        return Err(SavError::UnsupportedCompression {
            code: COMPRESSION_ZLIB,
        });
    }
    if magic != MAGIC {
        return Err(SavError::BadMagic);
    }

    let endian = detect_endian(&data[64..68])?;
    let mut cursor = ByteCursor::new(data, 68, endian);

    let nominal_case_size = cursor.read_i32()?;
    let compression = cursor.read_i32()?;
    match compression {
        COMPRESSION_NONE | COMPRESSION_BYTECODE => {}
        COMPRESSION_ZLIB => {
            return Err(SavError::UnsupportedCompression { code: compression });
        }
        other => {
            return Err(SavError::invalid_format(format!(
                "unrecognized compression code {other}"
            )));
        }
    }
    let weight_index = cursor.read_i32()?;
    let raw_cases = cursor.read_i32()?;
    let case_count = u64::try_from(raw_cases).ok();
    let bias = cursor.read_f64()?;
    let creation_date = trimmed_text(cursor.take(9)?);
    let creation_time = trimmed_text(cursor.take(8)?);
    let file_label = trimmed_text(cursor.take(64)?);
    cursor.skip(3)?;

    Ok(FileHeader {
        product: trimmed_text(&data[4..64]),
        endian,
        nominal_case_size,
        compression,
        weight_index,
        case_count,
        bias,
        creation_date,
        creation_time,
        file_label,
    })
}

/// The layout code is written as 2 (or 3 by some products) in the writer's
/// native byte order; reading it both ways identifies the file's order.
fn detect_endian(bytes: &[u8]) -> Result<Endian> {
    let little = Endian::Little.i32_from(bytes);
    if little == 2 || little == 3 {
        return Ok(Endian::Little);
    }
    let big = Endian::Big.i32_from(bytes);
    if big == 2 || big == 3 {
        return Ok(Endian::Big);
    }
    Err(SavError::invalid_format(format!(
        "unrecognized layout code {little}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header(layout: [u8; 4], compression: i32) -> Vec<u8> {
        let mut data = Vec::with_capacity(FILE_HEADER_LEN);
        data.extend_from_slice(MAGIC);
        data.extend_from_slice(&[b' '; 60]);
        data.extend_from_slice(&layout);
        data.extend_from_slice(&3i32.to_le_bytes());
        data.extend_from_slice(&compression.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&10i32.to_le_bytes());
        data.extend_from_slice(&100.0f64.to_le_bytes());
        data.extend_from_slice(b"05 aug 26");
        data.extend_from_slice(b"12:00:00");
        data.extend_from_slice(&[b' '; 64]);
        data.extend_from_slice(&[0u8; 3]);
        data
    }

    #[test]
    fn test_parse_little_endian_header() {
        let data = sample_header(2i32.to_le_bytes(), COMPRESSION_BYTECODE);
        let header = parse_file_header(&data).unwrap();
        assert_eq!(header.endian, Endian::Little);
        assert_eq!(header.nominal_case_size, 3);
        assert_eq!(header.compression, COMPRESSION_BYTECODE);
        assert_eq!(header.case_count, Some(10));
        assert_eq!(header.bias, 100.0);
        assert_eq!(header.creation_date, "05 aug 26");
    }

    #[test]
    fn test_bad_magic() {
        let mut data = sample_header(2i32.to_le_bytes(), COMPRESSION_NONE);
        data[0..4].copy_from_slice(b"NOPE");
        assert!(matches!(parse_file_header(&data), Err(SavError::BadMagic)));
    }

    #[test]
    fn test_zsav_rejected() {
        let mut data = sample_header(2i32.to_le_bytes(), COMPRESSION_NONE);
        data[0..4].copy_from_slice(MAGIC_ZSAV);
        assert!(matches!(
            parse_file_header(&data),
            Err(SavError::UnsupportedCompression { code: 2 })
        ));
    }

    #[test]
    fn test_zlib_compression_rejected() {
        let data = sample_header(2i32.to_le_bytes(), COMPRESSION_ZLIB);
        assert!(matches!(
            parse_file_header(&data),
            Err(SavError::UnsupportedCompression { code: 2 })
        ));
    }

    #[test]
    fn test_bad_layout_code() {
        let data = sample_header(9i32.to_le_bytes(), COMPRESSION_NONE);
        assert!(matches!(
            parse_file_header(&data),
            Err(SavError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_truncated_header() {
        let data = sample_header(2i32.to_le_bytes(), COMPRESSION_NONE);
        assert!(matches!(
            parse_file_header(&data[..100]),
            Err(SavError::InvalidFormat { .. })
        ));
    }
}
