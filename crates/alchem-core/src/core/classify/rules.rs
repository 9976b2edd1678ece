use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// The semantic role a matched column plays in the extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleKind {
    Gradient,
    EnergyDifference,
    PotentialEnergy,
    PressureVolume,
}

impl RoleKind {
    pub fn describe(self) -> &'static str {
        match self {
            RoleKind::Gradient => "dH/dl gradient",
            RoleKind::EnergyDifference => "energy difference",
            RoleKind::PotentialEnergy => "potential energy",
            RoleKind::PressureVolume => "pressure-volume",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    Exact,
    StartsWith,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnRule {
    pub role: RoleKind,
    #[serde(rename = "match")]
    pub kind: MatchKind,
    pub pattern: String,
}

impl ColumnRule {
    pub fn new(role: RoleKind, kind: MatchKind, pattern: &str) -> Self {
        Self {
            role,
            kind,
            pattern: pattern.to_string(),
        }
    }

    pub fn matches(&self, column: &str) -> bool {
        match self.kind {
            MatchKind::Exact => column == self.pattern,
            MatchKind::StartsWith => column.starts_with(&self.pattern),
            MatchKind::Contains => column.contains(&self.pattern),
        }
    }
}

/// An ordered list of column rules. The first rule matching a column decides
/// its role; columns matched by no rule are irrelevant to the extraction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RuleSet {
    /// Separator between an energy-difference column's prefix and the
    /// literal naming its target state.
    pub label_delimiter: String,
    pub rules: Vec<ColumnRule>,
}

#[derive(Debug, Error)]
pub enum RulesLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[rustfmt::skip]
const GROMACS_RULES: &[(RoleKind, MatchKind, &str)] = &[
    (RoleKind::Gradient,         MatchKind::Contains,   r"dH/d\xl\f{}"),
    (RoleKind::EnergyDifference, MatchKind::Contains,   r"\xD\f{}H \xl\f{}"),
    (RoleKind::PotentialEnergy,  MatchKind::Exact,      "Total Energy"),
    (RoleKind::PotentialEnergy,  MatchKind::Exact,      "Potential Energy"),
    (RoleKind::PressureVolume,   MatchKind::StartsWith, "pV"),
];

#[rustfmt::skip]
const GOMC_RULES: &[(RoleKind, MatchKind, &str)] = &[
    (RoleKind::Gradient,         MatchKind::StartsWith, "dU/dL"),
    (RoleKind::EnergyDifference, MatchKind::StartsWith, "DelE"),
    (RoleKind::PotentialEnergy,  MatchKind::StartsWith, "Total_En"),
    (RoleKind::PressureVolume,   MatchKind::StartsWith, "PV"),
];

impl RuleSet {
    fn from_table(label_delimiter: &str, table: &[(RoleKind, MatchKind, &str)]) -> Self {
        Self {
            label_delimiter: label_delimiter.to_string(),
            rules: table
                .iter()
                .map(|&(role, kind, pattern)| ColumnRule::new(role, kind, pattern))
                .collect(),
        }
    }

    /// Legend conventions of `gmx energy -odh` output.
    pub fn gromacs() -> Self {
        Self::from_table(" to ", GROMACS_RULES)
    }

    /// Header conventions of GOMC free-energy output.
    pub fn gomc() -> Self {
        Self::from_table("->", GOMC_RULES)
    }

    pub fn load(path: &Path) -> Result<Self, RulesLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| RulesLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| RulesLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// The role of the first rule matching `column`.
    pub fn role_of(&self, column: &str) -> Option<RoleKind> {
        self.rules
            .iter()
            .find(|rule| rule.matches(column))
            .map(|rule| rule.role)
    }
}
