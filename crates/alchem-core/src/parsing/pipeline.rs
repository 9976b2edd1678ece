use crate::core::assemble;
use crate::core::classify::classifier::{Classification, classify};
use crate::core::classify::rules::{RoleKind, RuleSet};
use crate::core::error::{FormatErrorKind, ParseError};
use crate::core::index::{IndexError, build_index, check_level_collisions};
use crate::core::models::frame::{GradientSeries, LabeledTable, ReducedPotentialMatrix};
use crate::core::models::state::StateLabel;
use crate::core::models::table::RawTable;
use crate::parsing::options::ExtractionOptions;
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, warn};

/// Index levels and the window state they hold.
pub(crate) type StateLevels<'a> = Option<(&'a [String], &'a StateLabel)>;

fn display(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Drops duplicate columns, checks for the time axis and classifies the rest.
pub(crate) fn prepare(
    path: &Path,
    table: RawTable,
    rules: &RuleSet,
) -> Result<(RawTable, Classification), ParseError> {
    let (table, dropped) = table.without_duplicate_columns();
    if !dropped.is_empty() {
        warn!("Dropped duplicate columns: {:?}", dropped);
    }
    if table.time().is_none() {
        return Err(ParseError::missing_column(&display(path), "time"));
    }

    let classification = classify(table.names(), rules).map_err(|e| {
        ParseError::format(
            &display(path),
            None,
            FormatErrorKind::TransitionLabel {
                column: e.column,
                reason: e.source.to_string(),
            },
        )
    })?;
    Ok((table, classification))
}

pub(crate) fn require(
    path: &Path,
    slot: Option<usize>,
    role: RoleKind,
) -> Result<usize, ParseError> {
    slot.ok_or_else(|| ParseError::missing_column(&display(path), role.describe()))
}

pub(crate) fn reduced_potentials(
    path: &Path,
    table: &RawTable,
    classification: &Classification,
    options: &ExtractionOptions,
    levels: StateLevels<'_>,
) -> Result<ReducedPotentialMatrix, ParseError> {
    let assembled = assemble::reduced_potentials(
        table,
        classification,
        options.beta(),
        options.contributions(),
    );
    if assembled.keys.is_empty() {
        debug!("No energy-difference columns found; returning an empty u_nk.");
    }
    finish(path, table, "u_nk", assembled.keys, assembled.values, levels)
}

/// Assembles β-scaled gradients for `components`, naming the value columns
/// `value_names` (same order, same length).
pub(crate) fn gradients(
    path: &Path,
    table: &RawTable,
    classification: &Classification,
    components: &[String],
    value_names: Vec<String>,
    beta: f64,
    levels: StateLevels<'_>,
) -> Result<GradientSeries, ParseError> {
    let assembled =
        assemble::gradients(table, classification, components, beta).map_err(|component| {
            ParseError::missing_column(
                &display(path),
                format!("{} for '{}'", RoleKind::Gradient.describe(), component),
            )
        })?;
    finish(path, table, "dH/dl", value_names, assembled.values, levels)
}

fn finish<K: Display>(
    path: &Path,
    table: &RawTable,
    name: &'static str,
    keys: Vec<K>,
    values: Vec<Vec<f64>>,
    levels: StateLevels<'_>,
) -> Result<LabeledTable<K>, ParseError> {
    let index = build_index(table, levels).map_err(|e| index_error(path, e))?;
    check_level_collisions(&index, &keys).map_err(|e| index_error(path, e))?;
    debug!(
        rows = index.len(),
        columns = keys.len(),
        "Assembled {} table.",
        name
    );
    Ok(LabeledTable::new(name, index, keys, values))
}

fn index_error(path: &Path, error: IndexError) -> ParseError {
    let path = display(path);
    match error {
        IndexError::MissingTime => ParseError::missing_column(&path, "time"),
        IndexError::StateArity { state, names } => ParseError::format(
            &path,
            None,
            FormatErrorKind::StateArity {
                state: state.to_string(),
                names,
            },
        ),
        IndexError::LevelCollision(level) => {
            ParseError::format(&path, None, FormatErrorKind::LevelCollision(level))
        }
    }
}

/// Name of a gradient value column: the component without a `-lambda` suffix.
pub(crate) fn value_name(component: &str) -> String {
    component
        .strip_suffix("-lambda")
        .unwrap_or(component)
        .to_string()
}

/// Name of a gradient index level: the component with a `-lambda` suffix.
pub(crate) fn lambda_level_name(component: &str) -> String {
    format!("{}-lambda", value_name(component))
}
