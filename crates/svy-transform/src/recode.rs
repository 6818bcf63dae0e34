//! Value-label substitution.

use std::collections::BTreeMap;

use polars::prelude::{AnyValue, DataFrame, NamedFrom, Series};
use tracing::debug;

use svy_ingest::metadata::ValueLabels;
use svy_ingest::polars_utils::{any_to_f64, any_to_string};

use crate::error::Result;

/// Replace coded cell values with their display labels.
///
/// For every column present in both the frame and the map, each cell whose
/// raw value has a dictionary entry becomes the label; cells without an
/// entry keep their raw value. Columns absent from the map are untouched.
/// The input frame is never modified; a new frame is returned.
///
/// A recoded column becomes a string column; unmatched numeric cells are
/// rendered without a trailing fractional part, so `3.0` stays `3`.
///
/// Known limitation: when a dictionary's label equals another raw code of
/// the same dictionary, applying the substitution to its own output maps
/// that cell again. Always substitute from the source frame.
pub fn apply_value_labels(
    frame: &DataFrame,
    value_labels: &BTreeMap<String, ValueLabels>,
) -> Result<DataFrame> {
    let mut result = frame.clone();

    for (name, labels) in value_labels {
        let Ok(column) = frame.column(name.as_str()) else {
            continue;
        };

        let mut replaced = 0usize;
        let mut values: Vec<Option<String>> = Vec::with_capacity(frame.height());
        for idx in 0..frame.height() {
            let value = column.get(idx).unwrap_or(AnyValue::Null);
            values.push(recode_cell(value, labels, &mut replaced));
        }

        if replaced == 0 {
            debug!(column = name.as_str(), "no coded values matched");
            continue;
        }
        debug!(column = name.as_str(), replaced, "recoded column");
        result.with_column(Series::new(name.as_str().into(), values))?;
    }

    Ok(result)
}

/// Recode one cell, counting actual substitutions.
fn recode_cell(
    value: AnyValue<'_>,
    labels: &ValueLabels,
    replaced: &mut usize,
) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(text) => Some(recode_text(text, labels, replaced)),
        AnyValue::StringOwned(text) => Some(recode_text(&text, labels, replaced)),
        other => {
            if let Some(number) = any_to_f64(other.clone()) {
                if let Some(label) = labels.lookup_number(number) {
                    *replaced += 1;
                    return Some(label.to_string());
                }
            }
            Some(any_to_string(other))
        }
    }
}

fn recode_text(text: &str, labels: &ValueLabels, replaced: &mut usize) -> String {
    match labels.lookup_text(text) {
        Some(label) => {
            *replaced += 1;
            label.to_string()
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;

    fn frame_with_codes() -> DataFrame {
        let codes: Vec<Option<f64>> = vec![Some(1.0), Some(2.0), Some(3.0), Some(1.0)];
        let cities = vec!["R", "M", "R", "X"];
        let columns: Vec<Column> = vec![
            Series::new("SEX".into(), codes).into(),
            Series::new("CITY".into(), cities).into(),
        ];
        DataFrame::new(columns).unwrap()
    }

    fn sex_labels() -> BTreeMap<String, ValueLabels> {
        let mut labels = ValueLabels::default();
        labels.insert_numeric(1.0, "Male");
        labels.insert_numeric(2.0, "Female");
        let mut map = BTreeMap::new();
        map.insert("SEX".to_string(), labels);
        map
    }

    fn column_strings(frame: &DataFrame, name: &str) -> Vec<String> {
        let column = frame.column(name).unwrap();
        (0..frame.height())
            .map(|idx| any_to_string(column.get(idx).unwrap()))
            .collect()
    }

    #[test]
    fn test_substitution_with_fallback() {
        let frame = frame_with_codes();
        let result = apply_value_labels(&frame, &sex_labels()).unwrap();
        // Value 3 has no entry and stays raw.
        assert_eq!(
            column_strings(&result, "SEX"),
            vec!["Male", "Female", "3", "Male"]
        );
    }

    #[test]
    fn test_unmapped_columns_untouched() {
        let frame = frame_with_codes();
        let result = apply_value_labels(&frame, &sex_labels()).unwrap();
        assert_eq!(
            result.column("CITY").unwrap().as_materialized_series(),
            frame.column("CITY").unwrap().as_materialized_series()
        );
    }

    #[test]
    fn test_source_frame_unchanged() {
        let frame = frame_with_codes();
        let before = column_strings(&frame, "SEX");
        let _ = apply_value_labels(&frame, &sex_labels()).unwrap();
        assert_eq!(column_strings(&frame, "SEX"), before);
    }

    #[test]
    fn test_shape_preserved() {
        let frame = frame_with_codes();
        let result = apply_value_labels(&frame, &sex_labels()).unwrap();
        assert_eq!(result.width(), frame.width());
        assert_eq!(result.height(), frame.height());
        let names: Vec<String> = result
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, vec!["SEX", "CITY"]);
    }

    #[test]
    fn test_dictionary_for_absent_column_ignored() {
        let frame = frame_with_codes();
        let mut map = sex_labels();
        let mut extra = ValueLabels::default();
        extra.insert_numeric(1.0, "Whatever");
        map.insert("NOT_HERE".to_string(), extra);
        let result = apply_value_labels(&frame, &map).unwrap();
        assert_eq!(result.width(), 2);
    }

    #[test]
    fn test_string_column_recode() {
        let mut labels = ValueLabels::default();
        labels.insert_text("R", "Rome");
        let mut map = BTreeMap::new();
        map.insert("CITY".to_string(), labels);

        let result = apply_value_labels(&frame_with_codes(), &map).unwrap();
        assert_eq!(
            column_strings(&result, "CITY"),
            vec!["Rome", "M", "Rome", "X"]
        );
    }

    #[test]
    fn test_missing_cells_stay_missing() {
        let codes: Vec<Option<f64>> = vec![Some(1.0), None];
        let columns: Vec<Column> = vec![Series::new("SEX".into(), codes).into()];
        let frame = DataFrame::new(columns).unwrap();

        let result = apply_value_labels(&frame, &sex_labels()).unwrap();
        let column = result.column("SEX").unwrap();
        assert_eq!(column.null_count(), 1);
        assert_eq!(any_to_string(column.get(0).unwrap()), "Male");
    }
}
