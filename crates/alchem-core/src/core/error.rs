use crate::core::models::state::LiteralError;
use crate::parsing::options::ConfigError;
use thiserror::Error;

/// Coarse classification of a [`ParseError`], for batch tooling that only
/// needs to decide whether to skip or report a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    Format,
    MissingColumn,
    NumericParse,
    Config,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Format error in '{path}'{}: {kind}", at_line(.line))]
    Format {
        path: String,
        line: Option<usize>,
        kind: FormatErrorKind,
    },
    #[error("Missing required column in '{path}': {role}")]
    MissingColumn { path: String, role: String },
    #[error("Invalid number on line {line} of '{path}' (value: '{value}')")]
    NumericParse {
        path: String,
        line: usize,
        value: String,
    },
    #[error("Invalid extraction options: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormatErrorKind {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("data row found before the column header")]
    MissingHeader,
    #[error("column header declared more than once")]
    DuplicateHeader,
    #[error("legend for data set s{0} is missing")]
    MissingLegend(usize),
    #[error("malformed directive: {0}")]
    Directive(String),
    #[error("invalid state declaration '{text}': {reason}")]
    StateDeclaration { text: String, reason: String },
    #[error("cannot decode target state from column '{column}': {reason}")]
    TransitionLabel { column: String, reason: String },
    #[error("state vector {state} does not match lambda components {names:?}")]
    StateArity { state: String, names: Vec<String> },
    #[error("index level '{0}' collides with a data column")]
    LevelCollision(String),
}

impl FormatErrorKind {
    pub(crate) fn state_literal(text: &str, source: LiteralError) -> Self {
        FormatErrorKind::StateDeclaration {
            text: text.to_string(),
            reason: source.to_string(),
        }
    }
}

fn at_line(line: &Option<usize>) -> String {
    line.map(|l| format!(" on line {}", l)).unwrap_or_default()
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Io { .. } => ErrorKind::Io,
            ParseError::Format { .. } => ErrorKind::Format,
            ParseError::MissingColumn { .. } => ErrorKind::MissingColumn,
            ParseError::NumericParse { .. } => ErrorKind::NumericParse,
            ParseError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn format(path: &str, line: Option<usize>, kind: FormatErrorKind) -> Self {
        ParseError::Format {
            path: path.to_string(),
            line,
            kind,
        }
    }

    pub(crate) fn missing_column(path: &str, role: impl Into<String>) -> Self {
        ParseError::MissingColumn {
            path: path.to_string(),
            role: role.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_message_includes_line_when_known() {
        let err = ParseError::format(
            "run.dat",
            Some(7),
            FormatErrorKind::FieldCount {
                expected: 5,
                found: 4,
            },
        );
        assert_eq!(
            err.to_string(),
            "Format error in 'run.dat' on line 7: expected 5 fields, found 4"
        );
    }

    #[test]
    fn format_error_message_omits_line_when_unknown() {
        let err = ParseError::format(
            "run.dat",
            None,
            FormatErrorKind::LevelCollision("VDW".into()),
        );
        assert_eq!(
            err.to_string(),
            "Format error in 'run.dat': index level 'VDW' collides with a data column"
        );
    }

    #[test]
    fn kind_distinguishes_error_families() {
        assert_eq!(
            ParseError::missing_column("a.xvg", "dH/dl for 'fep-lambda'").kind(),
            ErrorKind::MissingColumn
        );
        let numeric = ParseError::NumericParse {
            path: "a.xvg".into(),
            line: 3,
            value: "abc".into(),
        };
        assert_eq!(numeric.kind(), ErrorKind::NumericParse);
        assert_eq!(
            ParseError::format("a.xvg", None, FormatErrorKind::MissingHeader).kind(),
            ErrorKind::Format
        );
    }
}
