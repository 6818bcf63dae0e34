//! Survey data ingestion: SAV extraction, metadata handling, and upload
//! memoization.

pub mod cache;
pub mod error;
pub mod extract;
pub mod metadata;
pub mod polars_utils;

pub use cache::{UploadCache, UploadFingerprint};
pub use error::{IngestError, Result};
pub use extract::{SurveyData, extract, survey_from_dataset};
pub use metadata::{SurveyMetadata, ValueLabels};
pub use polars_utils::{any_to_f64, any_to_string, format_numeric, parse_f64};
