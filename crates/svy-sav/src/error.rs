//! Error types for SAV file operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading SAV files.
#[derive(Debug, Error)]
pub enum SavError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The byte stream does not start with the SAV magic word.
    #[error("not a SAV file: bad magic word")]
    BadMagic,

    /// Invalid SAV file structure.
    #[error("invalid SAV file: {message}")]
    InvalidFormat { message: String },

    /// Compression scheme this reader does not handle.
    #[error("unsupported SAV compression code {code}")]
    UnsupportedCompression { code: i32 },

    /// Dictionary record of an unknown type.
    #[error("unrecognized record type {record_type} at offset {offset}")]
    UnrecognizedRecord { record_type: i32, offset: usize },

    /// The byte stream ended inside a record.
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// A value-label record addresses a dictionary slot with no variable.
    #[error("value label index {index} does not address a variable")]
    BadLabelIndex { index: u32 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for SAV operations.
pub type Result<T> = std::result::Result<T, SavError>;

impl SavError {
    /// Create an InvalidFormat error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SavError::invalid_format("test message");
        assert_eq!(format!("{err}"), "invalid SAV file: test message");

        let err = SavError::UnsupportedCompression { code: 2 };
        assert_eq!(format!("{err}"), "unsupported SAV compression code 2");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let sav_err: SavError = io_err.into();
        assert!(matches!(sav_err, SavError::Io(_)));
    }
}
