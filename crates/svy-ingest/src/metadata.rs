//! Survey metadata: display labels extracted from the SAV dictionary.

use std::collections::BTreeMap;

use crate::polars_utils::format_numeric;

/// Code → display label dictionary for one variable.
///
/// Lookups accept the printable form of a code; numeric codes are also
/// indexed under a normalized key so `1`, `1.0`, and `1.00` all resolve to
/// the same entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueLabels {
    entries: Vec<(String, String)>,
    values: BTreeMap<String, String>,
    values_numeric: BTreeMap<String, String>,
}

impl ValueLabels {
    /// Insert a numeric code.
    pub fn insert_numeric(&mut self, code: f64, label: &str) {
        self.insert_text(&format_numeric(code), label);
    }

    /// Insert a code in printable form.
    pub fn insert_text(&mut self, code: &str, label: &str) {
        let code = code.trim();
        let label = label.trim();
        if code.is_empty() || label.is_empty() {
            return;
        }
        self.entries.push((code.to_string(), label.to_string()));
        self.values.insert(code.to_string(), label.to_string());
        if let Some(key) = normalize_numeric_key(code) {
            self.values_numeric.insert(key, label.to_string());
        }
    }

    /// Look up the label for a numeric cell value.
    pub fn lookup_number(&self, value: f64) -> Option<&str> {
        let key = normalize_numeric_key(&format_numeric(value))?;
        self.values_numeric.get(&key).map(String::as_str)
    }

    /// Look up the label for a string cell value.
    pub fn lookup_text(&self, raw: &str) -> Option<&str> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(label) = self.values.get(trimmed) {
            return Some(label);
        }
        let key = normalize_numeric_key(trimmed)?;
        self.values_numeric.get(&key).map(String::as_str)
    }

    /// Code/label pairs in file order, for display.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Display labels keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyMetadata {
    /// Variable name → column display label.
    pub column_labels: BTreeMap<String, String>,
    /// Variable name → value-label dictionary.
    pub value_labels: BTreeMap<String, ValueLabels>,
}

impl SurveyMetadata {
    /// The display label for a column, when the source carries one.
    pub fn label_for(&self, column: &str) -> Option<&str> {
        self.column_labels.get(column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.column_labels.is_empty() && self.value_labels.is_empty()
    }
}

/// Canonical key for numeric-looking codes: parse and re-print without a
/// trailing fractional part.
fn normalize_numeric_key(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = trimmed.parse::<f64>().ok()?;
    let mut text = format!("{parsed}");
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text.is_empty() { None } else { Some(text) }
}
