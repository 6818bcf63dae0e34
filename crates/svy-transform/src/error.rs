//! Error types for dataset transformations.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that can occur when transforming a survey frame.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The selection references a column the dataset does not have.
    #[error("selection references unknown column: {column}")]
    InvalidSelection { column: String },

    /// Two selected columns would be renamed onto the same output name.
    #[error("rename collision: {first} and {second} both map to \"{label}\"")]
    DuplicateLabel {
        label: String,
        first: String,
        second: String,
    },

    /// Internal dataframe failure.
    #[error(transparent)]
    Frame(#[from] PolarsError),
}

/// Result type alias for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
