//! SAV extraction: uploaded bytes → survey frame plus label maps.

use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use tracing::{debug, info};

use svy_sav::{SavDataset, SavType, SavValue, parse_sav_data};

use crate::error::Result;
use crate::metadata::{SurveyMetadata, ValueLabels};

/// One uploaded survey: the immutable source frame and its metadata.
#[derive(Debug, Clone)]
pub struct SurveyData {
    /// Source dataset, columns named by their raw SAV variable names.
    pub frame: DataFrame,
    /// Column and value labels extracted from the dictionary.
    pub metadata: SurveyMetadata,
}

/// Parse uploaded SAV bytes into a survey frame and its label maps.
///
/// Numeric variables become `Float64` columns with nulls for
/// system-missing cells; string variables become `String` columns.
/// Variables without a label or dictionary get no map entry.
pub fn extract(bytes: &[u8]) -> Result<SurveyData> {
    let dataset = parse_sav_data(bytes)?;
    survey_from_dataset(&dataset)
}

/// Shape an already-parsed SAV dataset into a survey frame.
pub fn survey_from_dataset(dataset: &SavDataset) -> Result<SurveyData> {
    let mut columns: Vec<Column> = Vec::with_capacity(dataset.num_columns());
    for (index, column) in dataset.columns.iter().enumerate() {
        match column.data_type {
            SavType::Num => {
                let mut values: Vec<Option<f64>> = Vec::with_capacity(dataset.num_rows());
                for row in &dataset.rows {
                    values.push(match row.get(index) {
                        Some(SavValue::Num(value)) => Some(*value),
                        _ => None,
                    });
                }
                columns.push(Series::new(column.name.as_str().into(), values).into());
            }
            SavType::Str => {
                let mut values: Vec<String> = Vec::with_capacity(dataset.num_rows());
                for row in &dataset.rows {
                    values.push(match row.get(index) {
                        Some(SavValue::Str(value)) => value.clone(),
                        _ => String::new(),
                    });
                }
                columns.push(Series::new(column.name.as_str().into(), values).into());
            }
        }
    }
    let frame = DataFrame::new(columns)?;

    let mut metadata = SurveyMetadata::default();
    for column in &dataset.columns {
        if let Some(label) = &column.label {
            metadata
                .column_labels
                .insert(column.name.clone(), label.clone());
        }
        if column.value_labels.is_empty() {
            continue;
        }
        let mut labels = ValueLabels::default();
        for (code, label) in &column.value_labels {
            match code {
                SavValue::Num(value) => labels.insert_numeric(*value, label),
                SavValue::Str(value) => labels.insert_text(value, label),
                SavValue::Missing => {}
            }
        }
        if !labels.is_empty() {
            metadata.value_labels.insert(column.name.clone(), labels);
        }
    }

    debug!(
        labelled_columns = metadata.column_labels.len(),
        coded_columns = metadata.value_labels.len(),
        "extracted survey metadata"
    );
    info!(
        columns = frame.width(),
        rows = frame.height(),
        "extracted survey frame"
    );

    Ok(SurveyData { frame, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;
    use svy_sav::SavColumn;

    fn sample_dataset() -> SavDataset {
        let mut dataset = SavDataset::with_columns(vec![
            SavColumn::numeric("V1").with_label("Age"),
            SavColumn::numeric("V2").with_value_labels(vec![
                (SavValue::numeric(1.0), "Yes".to_string()),
                (SavValue::numeric(2.0), "No".to_string()),
            ]),
            SavColumn::string("CITY", 8),
        ]);
        dataset.add_row(vec![
            SavValue::numeric(21.0),
            SavValue::numeric(1.0),
            SavValue::string("Rome"),
        ]);
        dataset.add_row(vec![
            SavValue::Missing,
            SavValue::numeric(2.0),
            SavValue::string(""),
        ]);
        dataset
    }

    #[test]
    fn test_frame_shape_and_types() {
        let survey = survey_from_dataset(&sample_dataset()).unwrap();
        assert_eq!(survey.frame.width(), 3);
        assert_eq!(survey.frame.height(), 2);

        let names: Vec<String> = survey
            .frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, vec!["V1", "V2", "CITY"]);

        // Missing numeric becomes null.
        let v1 = survey.frame.column("V1").unwrap();
        assert_eq!(v1.null_count(), 1);
    }

    #[test]
    fn test_metadata_extraction() {
        let survey = survey_from_dataset(&sample_dataset()).unwrap();
        assert_eq!(survey.metadata.label_for("V1"), Some("Age"));
        assert_eq!(survey.metadata.label_for("V2"), None);

        let labels = survey.metadata.value_labels.get("V2").unwrap();
        assert_eq!(labels.lookup_number(1.0), Some("Yes"));
        assert_eq!(labels.lookup_number(2.0), Some("No"));
        assert!(!survey.metadata.value_labels.contains_key("V1"));
        assert!(!survey.metadata.value_labels.contains_key("CITY"));
    }
}
