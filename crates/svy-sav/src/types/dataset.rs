//! Dataset container.

use super::column::SavColumn;
use super::value::SavValue;

/// A fully parsed SAV file: the dictionary plus row-major case data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavDataset {
    /// Product string from the file header.
    pub product: String,
    /// Optional file label from the header.
    pub file_label: Option<String>,
    /// Character encoding name from the dictionary, when recorded.
    pub encoding: Option<String>,
    /// Ordered variable definitions.
    pub columns: Vec<SavColumn>,
    /// Case data; each row has one value per column, in column order.
    pub rows: Vec<Vec<SavValue>>,
}

impl SavDataset {
    /// Create an empty dataset with the given columns.
    pub fn with_columns(columns: Vec<SavColumn>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    /// Append a row. The row length must match the column count.
    pub fn add_row(&mut self, row: Vec<SavValue>) {
        self.rows.push(row);
    }

    /// Number of cases.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of variables.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&SavColumn> {
        self.columns.iter().find(|column| column.name == name)
    }
}
