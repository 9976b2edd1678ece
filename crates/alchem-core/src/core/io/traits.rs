use crate::core::error::{FormatErrorKind, ParseError};
use crate::core::models::table::RawTable;
use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading a table, before the source path is known.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {kind}")]
    Format { line: usize, kind: FormatErrorKind },
    #[error("line {line}: invalid number '{value}'")]
    NumericParse { line: usize, value: String },
}

impl ReadError {
    pub fn at_path(self, path: &Path) -> ParseError {
        let path = path.to_string_lossy().to_string();
        match self {
            ReadError::Io(source) => ParseError::Io { path, source },
            ReadError::Format { line, kind } => ParseError::Format {
                path,
                line: Some(line),
                kind,
            },
            ReadError::NumericParse { line, value } => {
                ParseError::NumericParse { path, line, value }
            }
        }
    }
}

/// Defines the interface for reading an engine output file into a raw table.
pub trait TableSource {
    /// Format-specific information found outside the data rows.
    type Metadata;

    /// Reads a table and its metadata from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if a data row has the wrong number of fields, a field
    /// is not numeric, or the structural lines of the format are malformed.
    fn read_from(reader: &mut impl BufRead) -> Result<(RawTable, Self::Metadata), ReadError>;

    /// Reads a table and its metadata from a file path.
    ///
    /// The file is opened, read to completion and closed before returning, on
    /// success and on failure alike. Files ending in `.gz` or `.bz2` are
    /// decompressed while reading.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(RawTable, Self::Metadata), ParseError> {
        let path = path.as_ref();
        let mut reader = open_source(path).map_err(|e| ReadError::Io(e).at_path(path))?;
        Self::read_from(&mut reader).map_err(|e| e.at_path(path))
    }
}

/// Opens `path` for buffered reading, choosing a decoder from its extension.
pub fn open_source(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn BufRead> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("gz") => Box::new(BufReader::new(MultiGzDecoder::new(file))),
        Some("bz2") => Box::new(BufReader::new(BzDecoder::new(file))),
        _ => Box::new(BufReader::new(file)),
    };
    Ok(reader)
}

/// Splits a data line on whitespace and parses every field as `f64`.
pub(crate) fn parse_numeric_row(line: &str, line_num: usize) -> Result<Vec<f64>, ReadError> {
    line.split_whitespace()
        .map(|field| {
            field.parse::<f64>().map_err(|_| ReadError::NumericParse {
                line: line_num,
                value: field.to_string(),
            })
        })
        .collect()
}
