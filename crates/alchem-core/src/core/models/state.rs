use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A state-vector literal as it appears in engine output.
///
/// Only two shapes are accepted: a bare number (`0.5`) or a parenthesised,
/// comma-separated tuple of numbers (`(1.0, 0.0)`, `(0.25,)`). Anything else is
/// rejected, so labels embedded in column names can never smuggle in
/// arbitrary syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum StateLabel {
    Scalar(f64),
    Tuple(Vec<f64>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("literal is empty")]
    Empty,
    #[error("'{0}' is not a finite number")]
    InvalidNumber(String),
    #[error("unbalanced parentheses in '{0}'")]
    Unbalanced(String),
    #[error("tuple has no elements")]
    EmptyTuple,
}

impl StateLabel {
    pub fn parse(literal: &str) -> Result<Self, LiteralError> {
        let literal = literal.trim();
        if literal.is_empty() {
            return Err(LiteralError::Empty);
        }

        match (literal.strip_prefix('('), literal.ends_with(')')) {
            (Some(rest), true) => {
                let inner = &rest[..rest.len() - 1];
                if inner.contains(['(', ')']) {
                    return Err(LiteralError::Unbalanced(literal.to_string()));
                }
                // A single trailing comma is allowed: `(0.5,)` is a one-element tuple.
                let inner = inner.trim();
                let inner = inner.strip_suffix(',').unwrap_or(inner);
                if inner.trim().is_empty() {
                    return Err(LiteralError::EmptyTuple);
                }
                let values = inner
                    .split(',')
                    .map(parse_number)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(StateLabel::Tuple(values))
            }
            (None, false) => {
                if literal.contains(['(', ')']) {
                    return Err(LiteralError::Unbalanced(literal.to_string()));
                }
                parse_number(literal).map(StateLabel::Scalar)
            }
            _ => Err(LiteralError::Unbalanced(literal.to_string())),
        }
    }

    /// The raw values: one for a scalar, the tuple elements otherwise.
    pub fn values(&self) -> &[f64] {
        match self {
            StateLabel::Scalar(v) => std::slice::from_ref(v),
            StateLabel::Tuple(values) => values,
        }
    }

    /// Expands the label to one value per lambda component.
    ///
    /// A scalar is repeated `n` times. A tuple must already have exactly `n`
    /// elements; any other arity yields `None`.
    pub fn broadcast(&self, n: usize) -> Option<Vec<f64>> {
        match self {
            StateLabel::Scalar(v) => Some(vec![*v; n]),
            StateLabel::Tuple(values) if values.len() == n => Some(values.clone()),
            StateLabel::Tuple(_) => None,
        }
    }
}

fn parse_number(field: &str) -> Result<f64, LiteralError> {
    let field = field.trim();
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LiteralError::InvalidNumber(field.to_string())),
    }
}

impl FromStr for StateLabel {
    type Err = LiteralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateLabel::Scalar(v) => write!(f, "{:?}", v),
            StateLabel::Tuple(values) if values.len() == 1 => write!(f, "({:?},)", values[0]),
            StateLabel::Tuple(values) => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// The thermodynamic window a file was sampled from.
#[derive(Debug, Clone, PartialEq)]
pub struct StateDescriptor {
    /// Ordinal of the window, when the engine prints one.
    pub index: Option<usize>,
    pub lambda_names: Vec<String>,
    pub vector: StateLabel,
}

impl StateDescriptor {
    pub fn new(index: Option<usize>, lambda_names: Vec<String>, vector: StateLabel) -> Self {
        Self {
            index,
            lambda_names,
            vector,
        }
    }

    /// One state value per lambda component, or `None` on an arity mismatch.
    pub fn component_values(&self) -> Option<Vec<f64>> {
        self.vector.broadcast(self.lambda_names.len())
    }
}
