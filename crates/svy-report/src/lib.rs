//! Survey output generation.
//!
//! Renders a survey frame as an OOXML spreadsheet suitable for direct
//! download.

pub mod xlsx;

pub use xlsx::{DEFAULT_SHEET_NAME, write_xlsx, xlsx_bytes};
