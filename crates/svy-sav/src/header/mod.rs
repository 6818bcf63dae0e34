//! SAV dictionary record parsing.
//!
//! A SAV file opens with a fixed 176-byte file header, followed by a
//! sequence of typed dictionary records (variables, value labels,
//! documents, extensions) closed by a type-999 terminator, and then the
//! case data.

mod extension;
mod file;
mod labels;
mod variable;

pub use extension::{
    ExtensionRecord, SUBTYPE_ENCODING, SUBTYPE_FLOAT_INFO, SUBTYPE_LONG_NAMES,
    parse_encoding, parse_extension_record, parse_float_info, parse_long_variable_names,
};
pub use file::{
    COMPRESSION_BYTECODE, COMPRESSION_NONE, COMPRESSION_ZLIB, DEFAULT_SYSMIS, FILE_HEADER_LEN,
    FileHeader, parse_file_header,
};
pub use labels::{ValueLabelRecord, parse_value_label_record};
pub use variable::{VariableRecord, parse_variable_record};

/// Record type words appearing in the dictionary.
pub const RECORD_VARIABLE: i32 = 2;
pub const RECORD_VALUE_LABELS: i32 = 3;
pub const RECORD_VALUE_LABEL_VARS: i32 = 4;
pub const RECORD_DOCUMENTS: i32 = 6;
pub const RECORD_EXTENSION: i32 = 7;
pub const RECORD_TERMINATOR: i32 = 999;

/// Decode fixed-width dictionary text, dropping trailing padding.
pub(crate) fn trimmed_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches([' ', '\0'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_text() {
        assert_eq!(trimmed_text(b"AGE     "), "AGE");
        assert_eq!(trimmed_text(b"AGE\0\0\0\0\0"), "AGE");
        assert_eq!(trimmed_text(b"        "), "");
    }
}
