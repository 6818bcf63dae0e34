//! Variable record (type 2) handling.
//!
//! One record per dictionary slot. Numeric variables and string variables
//! up to 8 bytes occupy one slot; wider strings occupy one head slot plus
//! continuation slots (type code -1), one per additional 8-byte segment.
//!
//! # Structure (after the record type word)
//!
//! | Field            | Length | Description                              |
//! |------------------|--------|------------------------------------------|
//! | type             | 4      | 0 numeric, 1-255 string width, -1 cont.  |
//! | has_var_label    | 4      | 0 or 1                                   |
//! | n_missing_values | 4      | -3..=3; negative encodes a range         |
//! | print_format     | 4      | Format word (ignored)                    |
//! | write_format     | 4      | Format word (ignored)                    |
//! | name             | 8      | Short name, space padded                 |
//! | label_len, label | 4 + n  | Present when has_var_label = 1; the      |
//! |                  |        | label bytes are padded to a multiple of 4|
//! | missing values   | 8 each | abs(n_missing_values) doubles            |

use crate::cursor::ByteCursor;
use crate::error::{Result, SavError};

use super::trimmed_text;

/// A parsed variable record.
#[derive(Debug, Clone)]
pub struct VariableRecord {
    /// 0 numeric, 1-255 string width, -1 continuation slot.
    pub type_code: i32,
    /// Short variable name.
    pub name: String,
    /// Optional display label.
    pub label: Option<String>,
}

impl VariableRecord {
    /// Returns true for the continuation slots of a wide string variable.
    pub fn is_continuation(&self) -> bool {
        self.type_code == -1
    }
}

/// Parse one variable record; the record type word has already been
/// consumed.
pub fn parse_variable_record(cursor: &mut ByteCursor<'_>) -> Result<VariableRecord> {
    let type_code = cursor.read_i32()?;
    if !(-1..=255).contains(&type_code) {
        return Err(SavError::invalid_format(format!(
            "variable type code {type_code} out of range"
        )));
    }

    let has_label = cursor.read_i32()?;
    if !(0..=1).contains(&has_label) {
        return Err(SavError::invalid_format(format!(
            "variable label flag {has_label} out of range"
        )));
    }

    let n_missing = cursor.read_i32()?;
    if !(-3..=3).contains(&n_missing) {
        return Err(SavError::invalid_format(format!(
            "missing value count {n_missing} out of range"
        )));
    }

    let _print_format = cursor.read_i32()?;
    let _write_format = cursor.read_i32()?;
    let name = trimmed_text(cursor.take(8)?);

    let label = if has_label == 1 {
        let len = cursor.read_i32()?;
        let len = usize::try_from(len)
            .map_err(|_| SavError::invalid_format(format!("variable label length {len}")))?;
        let padded = len.div_ceil(4) * 4;
        let bytes = cursor.take(padded)?;
        let text = trimmed_text(&bytes[..len]);
        if text.is_empty() { None } else { Some(text) }
    } else {
        None
    };

    // Missing-value specifications are tolerated but not interpreted;
    // system-missing handling covers the conversion path.
    cursor.skip(n_missing.unsigned_abs() as usize * 8)?;

    Ok(VariableRecord {
        type_code,
        name,
        label,
    })
}
