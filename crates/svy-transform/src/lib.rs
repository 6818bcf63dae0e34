//! Survey dataset transformations.
//!
//! This crate provides the two interactive operations applied to an
//! extracted survey frame:
//!
//! - **recode**: value-label substitution with identity fallback
//! - **select**: column subsetting and label-based renaming
//!
//! Both return new frames; the source frame is never modified. A small
//! **preview** helper exposes the first rows for interface display.

pub mod error;
pub mod preview;
pub mod recode;
pub mod select;

pub use error::{Result, TransformError};
pub use preview::preview;
pub use recode::apply_value_labels;
pub use select::select_and_rename;
