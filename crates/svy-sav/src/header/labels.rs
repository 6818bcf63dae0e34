//! Value label records (types 3 and 4).
//!
//! A type-3 record carries coded value → label pairs; the type-4 record
//! that must follow it lists the 1-based dictionary indexes of the
//! variables the dictionary applies to. Coded values are raw 8-byte
//! elements: a double for numeric variables, space-padded text for short
//! string variables. They stay raw here because the target type is only
//! known once the indexes are resolved.

use crate::cursor::ByteCursor;
use crate::error::{Result, SavError};

use super::{RECORD_VALUE_LABEL_VARS, trimmed_text};

/// A parsed value-label dictionary with its target variable indexes.
#[derive(Debug, Clone)]
pub struct ValueLabelRecord {
    /// Raw 8-byte coded value paired with its label, in file order.
    pub entries: Vec<([u8; 8], String)>,
    /// 1-based dictionary indexes of the variables labelled by this record.
    pub indexes: Vec<u32>,
}

/// Parse a type-3 record and its mandatory type-4 companion; the type-3
/// record type word has already been consumed.
pub fn parse_value_label_record(cursor: &mut ByteCursor<'_>) -> Result<ValueLabelRecord> {
    let count = cursor.read_i32()?;
    let count = usize::try_from(count)
        .map_err(|_| SavError::invalid_format(format!("value label count {count}")))?;

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let mut value = [0u8; 8];
        value.copy_from_slice(cursor.take(8)?);
        let label_len = usize::from(cursor.take(1)?[0]);
        // The length byte plus label plus padding fills a multiple of 8.
        let label_area = (label_len + 1).div_ceil(8) * 8 - 1;
        let bytes = cursor.take(label_area)?;
        let label = trimmed_text(&bytes[..label_len]);
        entries.push((value, label));
    }

    let record_type = cursor.read_i32()?;
    if record_type != RECORD_VALUE_LABEL_VARS {
        return Err(SavError::invalid_format(
            "value label record not followed by a variable index record",
        ));
    }
    let var_count = cursor.read_i32()?;
    if var_count <= 0 {
        return Err(SavError::invalid_format(format!(
            "value label variable count {var_count}"
        )));
    }
    let mut indexes = Vec::with_capacity(var_count as usize);
    for _ in 0..var_count {
        let index = cursor.read_i32()?;
        let index = u32::try_from(index).ok().filter(|&index| index > 0).ok_or(
            SavError::BadLabelIndex {
                index: index.max(0) as u32,
            },
        )?;
        indexes.push(index);
    }

    Ok(ValueLabelRecord { entries, indexes })
}
