//! Error types for survey extraction.

use polars::prelude::PolarsError;
use svy_sav::SavError;
use thiserror::Error;

/// Errors that can occur while turning uploaded bytes into a survey frame.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The uploaded bytes are not a readable SAV file.
    #[error(transparent)]
    Sav(#[from] SavError),

    /// The parsed dictionary could not be shaped into a dataframe.
    #[error("dataframe construction failed: {0}")]
    Frame(#[from] PolarsError),
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
