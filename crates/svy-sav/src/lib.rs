//! SPSS system file (.sav) format reader.
//!
//! This crate parses the self-describing `.sav` dictionary (variable
//! definitions, display labels, value-label dictionaries, extension
//! records) and the case data that follows it, in either byte order, with
//! bytecode-compressed or uncompressed cases.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use svy_sav::read_sav;
//!
//! let dataset = read_sav(Path::new("survey.sav")).unwrap();
//! println!(
//!     "{}: {} variables, {} cases",
//!     dataset.product,
//!     dataset.num_columns(),
//!     dataset.num_rows()
//! );
//! ```
//!
//! # Values
//!
//! Cells are numeric, string, or system-missing:
//!
//! ```
//! use svy_sav::SavValue;
//!
//! let missing = SavValue::Missing;
//! assert!(missing.is_missing());
//! assert_eq!(SavValue::numeric(3.0).as_f64(), Some(3.0));
//! ```

mod cursor;
mod error;
pub mod header;
mod reader;
mod types;

// Re-export error types
pub use error::{Result, SavError};

// Re-export core types
pub use cursor::Endian;
pub use types::{SavColumn, SavDataset, SavType, SavValue};

// Re-export reader functionality
pub use reader::{SavReader, parse_sav_data, read_sav};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
