//! Read-only preview of the current frame.

use polars::prelude::DataFrame;

/// First `rows` rows of the frame, for interface display.
pub fn preview(frame: &DataFrame, rows: usize) -> DataFrame {
    frame.head(Some(rows))
}
