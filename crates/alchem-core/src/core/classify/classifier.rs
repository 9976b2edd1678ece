use crate::core::classify::rules::{RoleKind, RuleSet};
use crate::core::models::state::{LiteralError, StateLabel};
use thiserror::Error;
use tracing::{debug, warn};

/// Role of one raw-table column after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRole {
    /// The first column: time or step.
    Time,
    Gradient,
    /// An energy difference towards the decoded target state.
    EnergyDifference(StateLabel),
    PotentialEnergy,
    PressureVolume,
    Irrelevant,
}

/// Typed result of classifying every column of a raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// One role per column, in column order.
    pub roles: Vec<ColumnRole>,
    pub gradients: Vec<usize>,
    pub energy_differences: Vec<(usize, StateLabel)>,
    pub potential_energy: Option<usize>,
    pub pressure_volume: Option<usize>,
}

impl Classification {
    /// The first gradient column whose name contains `component`.
    pub fn gradient_for(&self, names: &[String], component: &str) -> Option<usize> {
        self.gradients
            .iter()
            .copied()
            .find(|&idx| names.get(idx).is_some_and(|n| n.contains(component)))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("delimiter '{0}' not found")]
    MissingDelimiter(String),
    #[error(transparent)]
    Literal(#[from] LiteralError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot decode target state from column '{column}': {source}")]
pub struct ClassifyError {
    pub column: String,
    pub source: LabelError,
}

/// Classifies `names` (the first being the time axis) against `rules`.
///
/// # Errors
///
/// Returns an error if an energy-difference column does not carry a
/// decodable target-state literal after the rule set's delimiter.
pub fn classify(names: &[String], rules: &RuleSet) -> Result<Classification, ClassifyError> {
    let mut classification = Classification {
        roles: Vec::with_capacity(names.len()),
        gradients: Vec::new(),
        energy_differences: Vec::new(),
        potential_energy: None,
        pressure_volume: None,
    };

    for (idx, name) in names.iter().enumerate() {
        if idx == 0 {
            classification.roles.push(ColumnRole::Time);
            continue;
        }

        let role = match rules.role_of(name) {
            None => ColumnRole::Irrelevant,
            Some(RoleKind::Gradient) => {
                classification.gradients.push(idx);
                ColumnRole::Gradient
            }
            Some(RoleKind::EnergyDifference) => {
                let label = decode_target_label(name, &rules.label_delimiter).map_err(|source| {
                    ClassifyError {
                        column: name.clone(),
                        source,
                    }
                })?;
                classification.energy_differences.push((idx, label.clone()));
                ColumnRole::EnergyDifference(label)
            }
            Some(RoleKind::PotentialEnergy) => claim_single(
                &mut classification.potential_energy,
                idx,
                name,
                ColumnRole::PotentialEnergy,
            ),
            Some(RoleKind::PressureVolume) => claim_single(
                &mut classification.pressure_volume,
                idx,
                name,
                ColumnRole::PressureVolume,
            ),
        };
        classification.roles.push(role);
    }

    debug!(
        gradients = classification.gradients.len(),
        energy_differences = classification.energy_differences.len(),
        potential_energy = ?classification.potential_energy,
        pressure_volume = ?classification.pressure_volume,
        "Classified {} columns.",
        names.len()
    );
    Ok(classification)
}

fn claim_single(slot: &mut Option<usize>, idx: usize, name: &str, role: ColumnRole) -> ColumnRole {
    if let Some(first) = *slot {
        warn!(
            "Ignoring column '{}' ({:?}); column {} already holds that role.",
            name, role, first
        );
        return ColumnRole::Irrelevant;
    }
    *slot = Some(idx);
    role
}

/// Decodes the target state named after `delimiter` in an energy-difference
/// column name, e.g. `DelE->(1.0,0.0)` or `\xD\f{}H \xl\f{} to 0.2000`.
///
/// Closing brackets left over from a surrounding group in the name are
/// stripped before the literal is parsed.
pub fn decode_target_label(column: &str, delimiter: &str) -> Result<StateLabel, LabelError> {
    let (_, tail) = column
        .split_once(delimiter)
        .ok_or_else(|| LabelError::MissingDelimiter(delimiter.to_string()))?;
    Ok(StateLabel::parse(strip_unbalanced_closers(tail.trim()))?)
}

fn strip_unbalanced_closers(text: &str) -> &str {
    let opens = text.chars().filter(|c| matches!(c, '(' | '[')).count();
    let mut closes = text.chars().filter(|c| matches!(c, ')' | ']')).count();
    let mut text = text;
    while closes > opens {
        match text.strip_suffix([')', ']']) {
            Some(rest) => {
                text = rest.trim_end();
                closes -= 1;
            }
            None => break,
        }
    }
    text
}
