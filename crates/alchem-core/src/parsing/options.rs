use crate::core::assemble::Contributions;
use crate::core::classify::rules::RuleSet;
use crate::core::units;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Settings shared by every extraction call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOptions {
    temperature: f64,
    beta: f64,
    contributions: Contributions,
    rules: Option<RuleSet>,
}

impl ExtractionOptions {
    /// Options for `temperature` (K) with every other setting at its default.
    pub fn new(temperature: f64) -> Result<Self, ConfigError> {
        ExtractionOptionsBuilder::new().temperature(temperature).build()
    }

    pub fn builder() -> ExtractionOptionsBuilder {
        ExtractionOptionsBuilder::new()
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// β = 1/(k_B·T) in mol/kJ.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn contributions(&self) -> Contributions {
        self.contributions
    }

    pub fn rules(&self) -> Option<&RuleSet> {
        self.rules.as_ref()
    }

    pub(crate) fn rules_or(&self, default: fn() -> RuleSet) -> Cow<'_, RuleSet> {
        match &self.rules {
            Some(rules) => Cow::Borrowed(rules),
            None => Cow::Owned(default()),
        }
    }
}

#[derive(Default)]
pub struct ExtractionOptionsBuilder {
    temperature: Option<f64>,
    include_potential: Option<bool>,
    include_pressure_volume: Option<bool>,
    rules: Option<RuleSet>,
}

impl ExtractionOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    /// Whether the potential-energy column is added to every reduced
    /// potential. Defaults to `true`; turn it off when the engine's energy
    /// differences already include it.
    pub fn include_potential(mut self, include: bool) -> Self {
        self.include_potential = Some(include);
        self
    }
    pub fn include_pressure_volume(mut self, include: bool) -> Self {
        self.include_pressure_volume = Some(include);
        self
    }
    /// Replaces the engine's built-in column rules.
    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn build(self) -> Result<ExtractionOptions, ConfigError> {
        let temperature = self
            .temperature
            .ok_or(ConfigError::MissingParameter("temperature"))?;
        let beta = units::beta(temperature).ok_or_else(|| ConfigError::InvalidParameter {
            name: "temperature",
            reason: format!("{} K is not a finite positive temperature", temperature),
        })?;
        Ok(ExtractionOptions {
            temperature,
            beta,
            contributions: Contributions {
                potential_energy: self.include_potential.unwrap_or(true),
                pressure_volume: self.include_pressure_volume.unwrap_or(true),
            },
            rules: self.rules,
        })
    }
}
