//! Interactive session state.
//!
//! One session owns one uploaded survey: an immutable source snapshot plus
//! the currently derived view. Transform toggles always re-derive from the
//! snapshot, so toggling value labels off restores the raw coding and a
//! failed operation leaves the previous view intact. The upload cache is
//! owned by the session, which keeps memoized parses scoped to it.

use std::sync::Arc;

use polars::prelude::DataFrame;
use tracing::info;

use svy_ingest::{IngestError, SurveyData, UploadCache};
use svy_transform::{TransformError, apply_value_labels, select_and_rename};

/// Session state behind the web interface.
#[derive(Default)]
pub struct Session {
    cache: UploadCache,
    source: Option<Arc<SurveyData>>,
    current: Option<DataFrame>,
    labels_applied: bool,
    selection: Option<Vec<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an uploaded file, replacing any previously loaded dataset.
    /// Repeated uploads of the same content reuse the memoized parse.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), IngestError> {
        let data = self.cache.fetch(bytes)?;
        info!(
            columns = data.frame.width(),
            rows = data.frame.height(),
            "session loaded dataset"
        );
        self.current = Some(data.frame.clone());
        self.source = Some(data);
        self.labels_applied = false;
        self.selection = None;
        Ok(())
    }

    /// The immutable source snapshot, when a dataset is loaded.
    pub fn source(&self) -> Option<&SurveyData> {
        self.source.as_deref()
    }

    /// The current derived view, when a dataset is loaded.
    pub fn current(&self) -> Option<&DataFrame> {
        self.current.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn labels_applied(&self) -> bool {
        self.labels_applied
    }

    /// The applied column selection; empty means "all columns".
    pub fn selection(&self) -> Option<&[String]> {
        self.selection.as_deref()
    }

    /// Toggle value-label substitution on or off.
    pub fn set_value_labels(&mut self, apply: bool) -> Result<(), TransformError> {
        let frame = self.derive(apply, self.selection.as_deref())?;
        self.labels_applied = apply;
        self.current = frame;
        Ok(())
    }

    /// Apply a column selection and label renaming. Selections always name
    /// source columns, regardless of any renaming already shown.
    pub fn set_selection(&mut self, selection: Vec<String>) -> Result<(), TransformError> {
        let frame = self.derive(self.labels_applied, Some(&selection))?;
        self.selection = Some(selection);
        self.current = frame;
        Ok(())
    }

    /// Derive a view from the source snapshot: substitution first, then
    /// selection and renaming. The candidate is only committed by callers
    /// on success, so prior state survives any failure.
    fn derive(
        &self,
        apply_labels: bool,
        selection: Option<&[String]>,
    ) -> Result<Option<DataFrame>, TransformError> {
        let Some(source) = &self.source else {
            return Ok(None);
        };
        let mut frame = source.frame.clone();
        if apply_labels {
            frame = apply_value_labels(&frame, &source.metadata.value_labels)?;
        }
        if let Some(selection) = selection {
            frame = select_and_rename(&frame, &source.metadata.column_labels, selection)?;
        }
        Ok(Some(frame))
    }

    #[cfg(test)]
    fn install(&mut self, data: Arc<SurveyData>) {
        self.current = Some(data.frame.clone());
        self.source = Some(data);
        self.labels_applied = false;
        self.selection = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svy_ingest::survey_from_dataset;
    use svy_sav::{SavColumn, SavDataset, SavValue};

    fn loaded_session() -> Session {
        let mut dataset = SavDataset::with_columns(vec![
            SavColumn::numeric("V1").with_label("Age"),
            SavColumn::numeric("SEX").with_value_labels(vec![
                (SavValue::numeric(1.0), "Male".to_string()),
                (SavValue::numeric(2.0), "Female".to_string()),
            ]),
        ]);
        dataset.add_row(vec![SavValue::numeric(21.0), SavValue::numeric(1.0)]);
        dataset.add_row(vec![SavValue::numeric(34.0), SavValue::numeric(3.0)]);

        let mut session = Session::new();
        session.install(Arc::new(survey_from_dataset(&dataset).unwrap()));
        session
    }

    fn names(frame: &DataFrame) -> Vec<String> {
        frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    #[test]
    fn test_empty_session() {
        let session = Session::new();
        assert!(!session.is_loaded());
        assert!(session.current().is_none());
    }

    #[test]
    fn test_label_toggle_round_trip() {
        let mut session = loaded_session();
        session.set_value_labels(true).unwrap();
        assert!(session.labels_applied());

        // Toggling off restores the raw coding from the snapshot.
        session.set_value_labels(false).unwrap();
        let current = session.current().unwrap();
        assert_eq!(
            current.column("SEX").unwrap().as_materialized_series(),
            session
                .source()
                .unwrap()
                .frame
                .column("SEX")
                .unwrap()
                .as_materialized_series()
        );
    }

    #[test]
    fn test_selection_applies_renames() {
        let mut session = loaded_session();
        session.set_selection(vec!["V1".to_string()]).unwrap();
        assert_eq!(names(session.current().unwrap()), vec!["Age"]);

        // Empty selection keeps everything, renamed where labelled.
        session.set_selection(Vec::new()).unwrap();
        assert_eq!(names(session.current().unwrap()), vec!["Age", "SEX"]);
    }

    #[test]
    fn test_failed_selection_keeps_prior_view() {
        let mut session = loaded_session();
        session.set_selection(vec!["V1".to_string()]).unwrap();

        let err = session.set_selection(vec!["NOPE".to_string()]).unwrap_err();
        assert!(matches!(err, TransformError::InvalidSelection { .. }));
        // Last good view is untouched.
        assert_eq!(names(session.current().unwrap()), vec!["Age"]);
        assert_eq!(session.selection(), Some(&["V1".to_string()][..]));
    }

    #[test]
    fn test_labels_then_selection_compose() {
        let mut session = loaded_session();
        session.set_value_labels(true).unwrap();
        session.set_selection(vec!["SEX".to_string()]).unwrap();

        let current = session.current().unwrap();
        assert_eq!(names(current), vec!["SEX"]);
        let cell = current.column("SEX").unwrap().get(0).unwrap();
        assert_eq!(svy_ingest::any_to_string(cell), "Male");
    }
}
