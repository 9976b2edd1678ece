//! Extraction from [GOMC](https://github.com/GOMC-WSU/GOMC) free-energy output.
//!
//! A GOMC file declares its columns on a `#Steps` header line and the sampled
//! window on a `State <i>: ...` comment. Energy-difference columns are named
//! `DelE->(<target state>)`; gradients `dU/dL(<component>)`; the total energy
//! and pressure-volume term `Total_En` and `PV`.

use crate::core::classify::rules::RuleSet;
use crate::core::error::ParseError;
use crate::core::io::gomc::{GOMC_LAMBDA_NAMES, GomcFile};
use crate::core::io::traits::TableSource;
use crate::core::models::frame::{GradientSeries, ReducedPotentialMatrix};
use crate::parsing::options::ExtractionOptions;
use crate::parsing::pipeline::{self, lambda_level_name, value_name};
use std::path::Path;
use tracing::instrument;

/// Returns the reduced potentials `u_nk` of a GOMC free-energy file sampled at
/// `temperature` (K).
///
/// Each column is `β·(ΔH + U + pV)` for one target state; rows are indexed by
/// step and the sampled `(Coulomb, VDW)` state.
pub fn extract_u_nk<P: AsRef<Path>>(
    path: P,
    temperature: f64,
) -> Result<ReducedPotentialMatrix, ParseError> {
    extract_u_nk_with(path, &ExtractionOptions::new(temperature)?)
}

pub fn extract_u_nk_with<P: AsRef<Path>>(
    path: P,
    options: &ExtractionOptions,
) -> Result<ReducedPotentialMatrix, ParseError> {
    u_nk(path.as_ref(), options)
}

/// Returns the dimensionless gradients `dH/dl` of a GOMC free-energy file
/// sampled at `temperature` (K), one column per lambda component.
pub fn extract_dhdl<P: AsRef<Path>>(
    path: P,
    temperature: f64,
) -> Result<GradientSeries, ParseError> {
    extract_dhdl_with(path, &ExtractionOptions::new(temperature)?)
}

pub fn extract_dhdl_with<P: AsRef<Path>>(
    path: P,
    options: &ExtractionOptions,
) -> Result<GradientSeries, ParseError> {
    dhdl(path.as_ref(), options)
}

#[instrument(skip_all, name = "gomc_u_nk", fields(path = %path.display()))]
fn u_nk(path: &Path, options: &ExtractionOptions) -> Result<ReducedPotentialMatrix, ParseError> {
    let (table, metadata) = GomcFile::read_from_path(path)?;
    let rules = options.rules_or(RuleSet::gomc);
    let (table, classification) = pipeline::prepare(path, table, &rules)?;

    let levels = metadata
        .state
        .as_ref()
        .map(|s| (s.lambda_names.as_slice(), &s.vector));
    pipeline::reduced_potentials(path, &table, &classification, options, levels)
}

#[instrument(skip_all, name = "gomc_dhdl", fields(path = %path.display()))]
fn dhdl(path: &Path, options: &ExtractionOptions) -> Result<GradientSeries, ParseError> {
    let (table, metadata) = GomcFile::read_from_path(path)?;
    let rules = options.rules_or(RuleSet::gomc);
    let (table, classification) = pipeline::prepare(path, table, &rules)?;

    let components: Vec<String> = match &metadata.state {
        Some(state) => state.lambda_names.clone(),
        None => GOMC_LAMBDA_NAMES.iter().map(|s| s.to_string()).collect(),
    };
    let value_names = components.iter().map(|c| value_name(c)).collect();
    let level_names: Vec<String> = components.iter().map(|c| lambda_level_name(c)).collect();
    let levels = metadata
        .state
        .as_ref()
        .map(|s| (level_names.as_slice(), &s.vector));

    pipeline::gradients(
        path,
        &table,
        &classification,
        &components,
        value_names,
        options.beta(),
        levels,
    )
}
