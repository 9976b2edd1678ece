use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("expected {expected} fields, found {found}")]
pub struct RowWidthError {
    pub expected: usize,
    pub found: usize,
}

/// An ordered set of named numeric columns of equal length.
///
/// The first column is always the time (or step) axis of the file. Column
/// names may repeat as read from disk; [`RawTable::without_duplicate_columns`]
/// keeps only the first occurrence of each name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl RawTable {
    pub fn new(names: Vec<String>) -> Self {
        let columns = vec![Vec::new(); names.len()];
        Self { names, columns }
    }

    pub fn push_row(&mut self, row: &[f64]) -> Result<(), RowWidthError> {
        if row.len() != self.names.len() {
            return Err(RowWidthError {
                expected: self.names.len(),
                found: row.len(),
            });
        }
        for (column, &value) in self.columns.iter_mut().zip(row) {
            column.push(value);
        }
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column(&self, idx: usize) -> Option<&[f64]> {
        self.columns.get(idx).map(Vec::as_slice)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|idx| self.column(idx))
    }

    /// The time axis: name and values of the first column.
    pub fn time(&self) -> Option<(&str, &[f64])> {
        self.names
            .first()
            .zip(self.columns.first())
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Drops every column whose name was already seen earlier in the table.
    ///
    /// Returns the reduced table and the names of the dropped columns, in
    /// file order. Applying it twice is the same as applying it once.
    pub fn without_duplicate_columns(self) -> (Self, Vec<String>) {
        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(self.names.len());
        let mut columns = Vec::with_capacity(self.columns.len());
        let mut dropped = Vec::new();

        for (name, column) in self.names.into_iter().zip(self.columns) {
            if seen.insert(name.clone()) {
                names.push(name);
                columns.push(column);
            } else {
                dropped.push(name);
            }
        }

        (Self { names, columns }, dropped)
    }
}
