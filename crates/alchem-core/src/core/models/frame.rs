use crate::core::models::state::StateLabel;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Name of the time level of every frame index.
pub const TIME_LEVEL: &str = "time";

/// The key of one sampled frame: its time and the state it was sampled from.
#[derive(Debug, Clone, PartialEq)]
pub struct RowKey {
    pub time: f64,
    /// One value per lambda level, in level order. Empty when the file
    /// declares no state.
    pub state: Vec<f64>,
}

/// Composite row index of an extracted table, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameIndex {
    level_names: Vec<String>,
    keys: Vec<RowKey>,
}

impl FrameIndex {
    pub(crate) fn new(level_names: Vec<String>, keys: Vec<RowKey>) -> Self {
        Self { level_names, keys }
    }

    /// Names of the lambda levels, excluding the time level.
    pub fn level_names(&self) -> &[String] {
        &self.level_names
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.keys.iter().map(|k| k.time)
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV writing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("CSV writing error: {0}")]
    Writer(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A frame-indexed table of β-scaled values, stored column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable<K> {
    name: &'static str,
    index: FrameIndex,
    columns: Vec<K>,
    values: Vec<Vec<f64>>,
}

/// Reduced potentials `u_nk`: one column per target state.
pub type ReducedPotentialMatrix = LabeledTable<StateLabel>;

/// Dimensionless gradients `dH/dl`: one column per lambda component.
pub type GradientSeries = LabeledTable<String>;

impl<K> LabeledTable<K> {
    pub(crate) fn new(
        name: &'static str,
        index: FrameIndex,
        columns: Vec<K>,
        values: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        debug_assert!(values.iter().all(|v| v.len() == index.len()));
        Self {
            name,
            index,
            columns,
            values,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn index(&self) -> &FrameIndex {
        &self.index
    }

    pub fn columns(&self) -> &[K] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.index.is_empty()
    }

    pub fn column_at(&self, idx: usize) -> Option<&[f64]> {
        self.values.get(idx).map(Vec::as_slice)
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(col).and_then(|c| c.get(row)).copied()
    }

    /// All column values of one frame, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.num_rows() {
            return None;
        }
        Some(self.values.iter().map(|c| c[row]).collect())
    }
}

impl<K: PartialEq> LabeledTable<K> {
    pub fn column(&self, key: &K) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == key)
            .and_then(|idx| self.column_at(idx))
    }
}

impl LabeledTable<String> {
    pub fn column_named(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.column_at(idx))
    }
}

impl<K: Display> LabeledTable<K> {
    /// Writes the table as CSV: `time`, the lambda levels, then one column per key.
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let header = std::iter::once(TIME_LEVEL.to_string())
            .chain(self.index.level_names.iter().cloned())
            .chain(self.columns.iter().map(ToString::to_string));
        csv_writer.write_record(header)?;

        for (row, key) in self.index.keys.iter().enumerate() {
            let record = std::iter::once(key.time)
                .chain(key.state.iter().copied())
                .chain(self.values.iter().map(|c| c[row]))
                .map(|v| v.to_string());
            csv_writer.write_record(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        self.write_csv_to(file).map_err(|e| match e {
            ExportError::Writer(source) => ExportError::Csv {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => other,
        })
    }
}
