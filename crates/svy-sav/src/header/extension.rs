//! Extension records (type 7).
//!
//! Self-sizing records: subtype, element size, element count, then
//! `size * count` data bytes. Unknown subtypes are skipped by size, which
//! keeps the reader forward-compatible with newer writers.

use crate::cursor::{ByteCursor, Endian};
use crate::error::{Result, SavError};

use super::trimmed_text;

/// Machine float info; first double is the system-missing value.
pub const SUBTYPE_FLOAT_INFO: i32 = 4;
/// Long variable names: `SHORT=Long` pairs separated by tabs.
pub const SUBTYPE_LONG_NAMES: i32 = 13;
/// Character encoding name.
pub const SUBTYPE_ENCODING: i32 = 20;

/// A raw extension record.
#[derive(Debug, Clone)]
pub struct ExtensionRecord<'a> {
    /// Record subtype.
    pub subtype: i32,
    /// Raw record payload (`size * count` bytes).
    pub data: &'a [u8],
}

/// Parse one extension record; the record type word has already been
/// consumed.
pub fn parse_extension_record<'a>(cursor: &mut ByteCursor<'a>) -> Result<ExtensionRecord<'a>> {
    let subtype = cursor.read_i32()?;
    let size = cursor.read_i32()?;
    let count = cursor.read_i32()?;
    if size < 0 || count < 0 {
        return Err(SavError::invalid_format(format!(
            "extension record {subtype} with negative dimensions"
        )));
    }
    let total = (size as usize)
        .checked_mul(count as usize)
        .ok_or_else(|| SavError::invalid_format("extension record size overflow"))?;
    let data = cursor.take(total)?;
    Ok(ExtensionRecord { subtype, data })
}

/// Parse subtype-13 payload into `(short, long)` name pairs.
pub fn parse_long_variable_names(data: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(data);
    let mut pairs = Vec::new();
    for part in text.split('\t') {
        if let Some((short, long)) = part.split_once('=') {
            let short = short.trim_matches(['\0', ' ']);
            let long = long.trim_matches(['\0', ' ']);
            if !short.is_empty() && !long.is_empty() {
                pairs.push((short.to_string(), long.to_string()));
            }
        }
    }
    pairs
}

/// Parse subtype-4 payload; returns the recorded system-missing value.
pub fn parse_float_info(data: &[u8], endian: Endian) -> Option<f64> {
    if data.len() < 8 {
        return None;
    }
    Some(endian.f64_from(&data[..8]))
}

/// Parse subtype-20 payload: the encoding name.
pub fn parse_encoding(data: &[u8]) -> String {
    trimmed_text(data)
}
