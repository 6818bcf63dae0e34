//! Column definitions.

use super::value::SavValue;

/// Variable data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavType {
    /// Numeric variable (8-byte double).
    Num,
    /// String variable of a declared byte width.
    Str,
}

/// A variable in a SAV dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct SavColumn {
    /// Variable name as stored in the dictionary (long name when the file
    /// carries a long-variable-names record).
    pub name: String,
    /// Optional display label.
    pub label: Option<String>,
    /// Data type.
    pub data_type: SavType,
    /// Declared byte width for string variables; 0 for numeric.
    pub width: u16,
    /// Coded value → display label pairs, in file order. Empty when the
    /// variable has no value-label dictionary.
    pub value_labels: Vec<(SavValue, String)>,
}

impl SavColumn {
    /// Create a numeric column.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            data_type: SavType::Num,
            width: 0,
            value_labels: Vec::new(),
        }
    }

    /// Create a string column with the given byte width.
    pub fn string(name: impl Into<String>, width: u16) -> Self {
        Self {
            name: name.into(),
            label: None,
            data_type: SavType::Str,
            width,
            value_labels: Vec::new(),
        }
    }

    /// Attach a display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attach a value-label dictionary.
    #[must_use]
    pub fn with_value_labels(mut self, labels: Vec<(SavValue, String)>) -> Self {
        self.value_labels = labels;
        self
    }

    /// Returns true for string columns.
    pub fn is_string(&self) -> bool {
        self.data_type == SavType::Str
    }

    /// Number of 8-byte data elements one cell of this column occupies.
    pub fn segments(&self) -> usize {
        match self.data_type {
            SavType::Num => 1,
            SavType::Str => usize::from(self.width).div_ceil(8).max(1),
        }
    }
}
