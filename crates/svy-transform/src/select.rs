//! Column selection and renaming.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{Column, DataFrame};
use tracing::debug;

use crate::error::{Result, TransformError};

/// Keep the selected columns, in the given order, renaming each to its
/// display label when one exists.
///
/// An empty selection means "all columns in current order". Every selected
/// identifier must name a column of the frame; a selection that would put
/// two columns under the same output name is rejected rather than silently
/// dropping one. The input frame is never modified.
pub fn select_and_rename(
    frame: &DataFrame,
    labels: &BTreeMap<String, String>,
    selection: &[String],
) -> Result<DataFrame> {
    let current: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let effective: Vec<String> = if selection.is_empty() {
        current.clone()
    } else {
        selection.to_vec()
    };

    let known: BTreeSet<&str> = current.iter().map(String::as_str).collect();
    for column in &effective {
        if !known.contains(column.as_str()) {
            return Err(TransformError::InvalidSelection {
                column: column.clone(),
            });
        }
    }

    // Resolve output names up front so a collision fails before anything
    // is built.
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    let mut targets: Vec<String> = Vec::with_capacity(effective.len());
    for column in &effective {
        let target = labels
            .get(column)
            .cloned()
            .unwrap_or_else(|| column.clone());
        if let Some(first) = seen.get(&target) {
            return Err(TransformError::DuplicateLabel {
                label: target,
                first: first.clone(),
                second: column.clone(),
            });
        }
        seen.insert(target.clone(), column.clone());
        targets.push(target);
    }

    let selected = frame.select(effective.iter().cloned())?;
    let mut columns: Vec<Column> = Vec::with_capacity(targets.len());
    for (column, target) in selected.get_columns().iter().zip(&targets) {
        columns.push(column.clone().with_name(target.as_str().into()));
    }
    let renamed = DataFrame::new(columns)?;

    debug!(
        selected = renamed.width(),
        renamed = targets
            .iter()
            .zip(&effective)
            .filter(|(target, column)| target != column)
            .count(),
        "applied column selection"
    );
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn sample_frame() -> DataFrame {
        let columns: Vec<Column> = vec![
            Series::new("V1".into(), vec![1.0f64, 2.0, 3.0]).into(),
            Series::new("V2".into(), vec!["a", "b", "c"]).into(),
            Series::new("V3".into(), vec![10.0f64, 20.0, 30.0]).into(),
        ];
        DataFrame::new(columns).unwrap()
    }

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn names(frame: &DataFrame) -> Vec<String> {
        frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    #[test]
    fn test_subset_in_selection_order() {
        let frame = sample_frame();
        let result = select_and_rename(
            &frame,
            &labels(&[("V1", "Age")]),
            &["V3".to_string(), "V1".to_string()],
        )
        .unwrap();
        assert_eq!(names(&result), vec!["V3", "Age"]);
        assert_eq!(result.height(), 3);
    }

    #[test]
    fn test_empty_selection_means_all_columns() {
        let frame = sample_frame();
        let result = select_and_rename(&frame, &labels(&[("V2", "City")]), &[]).unwrap();
        assert_eq!(names(&result), vec!["V1", "City", "V3"]);
        assert_eq!(result.height(), frame.height());
    }

    #[test]
    fn test_rename_identity_fallback() {
        let frame = sample_frame();
        let result = select_and_rename(&frame, &BTreeMap::new(), &[]).unwrap();
        assert_eq!(names(&result), vec!["V1", "V2", "V3"]);
    }

    #[test]
    fn test_invalid_selection_rejected() {
        let frame = sample_frame();
        let err = select_and_rename(&frame, &BTreeMap::new(), &["NOPE".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidSelection { column } if column == "NOPE"
        ));
        // Input untouched.
        assert_eq!(names(&frame), vec!["V1", "V2", "V3"]);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let frame = sample_frame();
        let err = select_and_rename(
            &frame,
            &labels(&[("V1", "Same"), ("V3", "Same")]),
            &["V1".to_string(), "V3".to_string()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TransformError::DuplicateLabel { label, first, second }
                if label == "Same" && first == "V1" && second == "V3"
        ));
    }

    #[test]
    fn test_label_colliding_with_kept_name_rejected() {
        // V1 renamed onto V2's kept identifier.
        let frame = sample_frame();
        let err = select_and_rename(
            &frame,
            &labels(&[("V1", "V2")]),
            &["V1".to_string(), "V2".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::DuplicateLabel { .. }));
    }

    #[test]
    fn test_swapped_names_allowed() {
        // V1 -> V2 and V2 -> V1 is a permutation, not a collision.
        let frame = sample_frame();
        let result = select_and_rename(
            &frame,
            &labels(&[("V1", "V2"), ("V2", "V1")]),
            &["V1".to_string(), "V2".to_string()],
        )
        .unwrap();
        assert_eq!(names(&result), vec!["V2", "V1"]);
    }

    #[test]
    fn test_row_values_preserved() {
        let frame = sample_frame();
        let result = select_and_rename(&frame, &labels(&[("V3", "Score")]), &["V3".to_string()])
            .unwrap();
        let column = result.column("Score").unwrap();
        let values: Vec<f64> = (0..result.height())
            .map(|idx| match column.get(idx).unwrap() {
                polars::prelude::AnyValue::Float64(v) => v,
                other => panic!("unexpected value {other:?}"),
            })
            .collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
    }
}
