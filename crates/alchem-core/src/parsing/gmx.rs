//! Extraction from GROMACS `dhdl.xvg` files.
//!
//! The XVG legends carry the column semantics: `Total Energy` (or `Potential
//! Energy`), one `dH/dλ <component> = <value>` gradient per lambda component,
//! one `ΔH λ to <target state>` energy difference per foreign state and a
//! trailing `pV` term. The sampled window is read from the subtitle
//! (`state <i>: (<components>) = (<values>)`) or, for older files, from the
//! gradient legends.

use crate::core::classify::classifier::Classification;
use crate::core::classify::rules::{RoleKind, RuleSet};
use crate::core::error::{FormatErrorKind, ParseError};
use crate::core::io::traits::TableSource;
use crate::core::io::xvg::{XvgFile, XvgMetadata};
use crate::core::models::frame::{GradientSeries, ReducedPotentialMatrix};
use crate::core::models::state::{StateDescriptor, StateLabel};
use crate::core::models::table::RawTable;
use crate::parsing::options::ExtractionOptions;
use crate::parsing::pipeline::{self, lambda_level_name, value_name};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Gradient component assumed when the file declares none.
pub const DEFAULT_LAMBDA: &str = "fep-lambda";

const GRADIENT_MARKER: &str = r"dH/d\xl\f{}";

/// Returns the reduced potentials `u_nk` of a GROMACS `dhdl.xvg` file sampled
/// at `temperature` (K).
///
/// Each column is `β·(ΔH + U + pV)` for one foreign state. A file with
/// energy-difference columns must also carry the potential energy unless it is
/// switched off in the options.
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

/// Returns the dimensionless gradients `dH/dl` of a GROMACS `dhdl.xvg` file
/// sampled at `temperature` (K), one column per declared lambda component.
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
    dhdl(path.as_ref(), None, options)
}

/// Returns the β-scaled gradient of the single component `name`
/// (e.g. `"fep-lambda"`).
pub fn extract_dhdl_component<P: AsRef<Path>>(
    path: P,
    name: &str,
    temperature: f64,
) -> Result<GradientSeries, ParseError> {
    extract_dhdl_component_with(path, name, &ExtractionOptions::new(temperature)?)
}

pub fn extract_dhdl_component_with<P: AsRef<Path>>(
    path: P,
    name: &str,
    options: &ExtractionOptions,
) -> Result<GradientSeries, ParseError> {
    dhdl(path.as_ref(), Some(name), options)
}

#[instrument(skip_all, name = "gmx_u_nk", fields(path = %path.display()))]
fn u_nk(path: &Path, options: &ExtractionOptions) -> Result<ReducedPotentialMatrix, ParseError> {
    let (table, classification, state) = load(path, options)?;

    let has_differences = !classification.energy_differences.is_empty();
    if options.contributions().potential_energy && has_differences {
        pipeline::require(path, classification.potential_energy, RoleKind::PotentialEnergy)?;
    }

    let levels = state
        .as_ref()
        .map(|s| (s.lambda_names.as_slice(), &s.vector));
    pipeline::reduced_potentials(path, &table, &classification, options, levels)
}

#[instrument(skip_all, name = "gmx_dhdl", fields(path = %path.display()))]
fn dhdl(
    path: &Path,
    component: Option<&str>,
    options: &ExtractionOptions,
) -> Result<GradientSeries, ParseError> {
    let (table, classification, state) = load(path, options)?;

    let components: Vec<String> = match (component, &state) {
        (Some(name), _) => vec![name.to_string()],
        (None, Some(s)) => s.lambda_names.clone(),
        (None, None) => vec![DEFAULT_LAMBDA.to_string()],
    };
    let value_names = components.iter().map(|c| value_name(c)).collect();

    let level_names: Vec<String> = state
        .as_ref()
        .map(|s| s.lambda_names.iter().map(|c| lambda_level_name(c)).collect())
        .unwrap_or_default();
    let levels = state
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

fn load(
    path: &Path,
    options: &ExtractionOptions,
) -> Result<(RawTable, Classification, Option<StateDescriptor>), ParseError> {
    let (table, metadata) = XvgFile::read_from_path(path)?;
    let rules = options.rules_or(RuleSet::gromacs);
    let (table, classification) = pipeline::prepare(path, table, &rules)?;

    let header = parse_header(&metadata).map_err(|kind| {
        ParseError::format(&path.to_string_lossy(), None, kind)
    })?;
    if let Some(file_t) = header
        .temperature
        .filter(|t| (t - options.temperature()).abs() > 1e-6)
    {
        warn!(
            "File was sampled at {} K but {} K was requested.",
            file_t,
            options.temperature()
        );
    }

    let state = match header.state {
        Some(state) => Some(state),
        None => state_from_gradient_legends(&table, &classification),
    };
    debug!(state = ?state, "Resolved sampled window.");
    Ok((table, classification, state))
}

/// Information carried by the XVG subtitle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XvgHeader {
    pub temperature: Option<f64>,
    pub state: Option<StateDescriptor>,
}

/// Parses a subtitle such as
/// `T = 300 (K) \xl\f{} state 2: (coul-lambda, vdw-lambda) = (0.5000, 1.0000)`.
pub fn parse_header(metadata: &XvgMetadata) -> Result<XvgHeader, FormatErrorKind> {
    let Some(subtitle) = metadata.subtitle.as_deref() else {
        return Ok(XvgHeader::default());
    };

    let temperature = subtitle
        .split_once("T = ")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .and_then(|t| t.parse::<f64>().ok());

    let state = match subtitle.split_once("state ") {
        Some((_, declaration)) => Some(parse_state_declaration(subtitle, declaration)?),
        None => None,
    };

    Ok(XvgHeader { temperature, state })
}

fn parse_state_declaration(
    subtitle: &str,
    declaration: &str,
) -> Result<StateDescriptor, FormatErrorKind> {
    let invalid = |reason: &str| FormatErrorKind::StateDeclaration {
        text: subtitle.to_string(),
        reason: reason.to_string(),
    };

    let (index_text, rest) = declaration
        .split_once(':')
        .ok_or_else(|| invalid("missing ':' after state index"))?;
    let index = index_text
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid("state index is not a non-negative integer"))?;
    let (names_text, values_text) = rest
        .split_once(" = ")
        .ok_or_else(|| invalid("missing ' = ' between components and values"))?;

    let names_text = names_text.trim();
    let names_text = names_text
        .strip_prefix('(')
        .and_then(|n| n.strip_suffix(')'))
        .unwrap_or(names_text);
    let lambda_names: Vec<String> = names_text
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();
    if lambda_names.is_empty() {
        return Err(invalid("no lambda components declared"));
    }

    let vector = StateLabel::parse(values_text)
        .map_err(|e| FormatErrorKind::state_literal(subtitle, e))?;
    Ok(StateDescriptor::new(Some(index), lambda_names, vector))
}

/// Recovers the window from legends of the form `dH/dλ <component> = <value>`.
///
/// Returns `None` if there are no gradient columns or any legend does not
/// follow that form.
fn state_from_gradient_legends(
    table: &RawTable,
    classification: &Classification,
) -> Option<StateDescriptor> {
    let mut names = Vec::new();
    let mut values = Vec::new();
    for &idx in &classification.gradients {
        let legend = table.names().get(idx)?;
        let (_, tail) = legend.split_once(GRADIENT_MARKER)?;
        let (name, value) = tail.split_once(" = ")?;
        names.push(name.trim().to_string());
        values.push(value.trim().parse::<f64>().ok()?);
    }

    let vector = match values.as_slice() {
        [] => return None,
        [single] => StateLabel::Scalar(*single),
        _ => StateLabel::Tuple(values),
    };
    Some(StateDescriptor::new(None, names, vector))
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("'{program}' finished but did not write '{path}'")]
    MissingOutput { program: String, path: String },
}

/// Handle to the GROMACS command-line driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GmxCommand {
    executable: PathBuf,
}

impl Default for GmxCommand {
    fn default() -> Self {
        Self::new("gmx")
    }
}

impl GmxCommand {
    pub fn new<P: Into<PathBuf>>(executable: P) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Runs `gmx energy -f <edr> -s <tpr> -odh <xvg>` and returns the path of
    /// the written XVG file.
    #[instrument(skip_all, name = "gmx_energy", fields(xvg = %xvg.display()))]
    pub fn energy_to_xvg(&self, tpr: &Path, edr: &Path, xvg: &Path) -> Result<PathBuf, GenerateError> {
        let program = self.executable.to_string_lossy().to_string();
        info!("Running '{} energy' to extract Hamiltonian differences.", program);

        let output = Command::new(&self.executable)
            .arg("energy")
            .arg("-f")
            .arg(edr)
            .arg("-s")
            .arg(tpr)
            .arg("-odh")
            .arg(xvg)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GenerateError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(GenerateError::Failed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !xvg.exists() {
            return Err(GenerateError::MissingOutput {
                program,
                path: xvg.to_string_lossy().to_string(),
            });
        }
        Ok(xvg.to_path_buf())
    }
}

/// Writes the `dhdl.xvg` of a run from its `.tpr` and `.edr` files with the
/// default `gmx` executable.
pub fn generate_source(
    tpr: impl AsRef<Path>,
    edr: impl AsRef<Path>,
    xvg: impl AsRef<Path>,
) -> Result<PathBuf, GenerateError> {
    GmxCommand::default().energy_to_xvg(tpr.as_ref(), edr.as_ref(), xvg.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::rules::{ColumnRule, MatchKind};
    use crate::core::error::ErrorKind;
    use std::fs;
    use tempfile::tempdir;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn beta(t: f64) -> f64 {
        1.0 / (8.3144621e-3 * t)
    }

    const SINGLE_LAMBDA: &str = r#"# gmx energy -odh
@    title "dH/d\xl\f{} and \xD\f{}H"
@    xaxis  label "Time (ps)"
@ subtitle "T = 300 (K) \xl\f{} state 1: fep-lambda = 0.5000"
@ s0 legend "Total Energy"
@ s1 legend "dH/d\xl\f{} fep-lambda = 0.5000"
@ s2 legend "\xD\f{}H \xl\f{} to 0.0000"
@ s3 legend "\xD\f{}H \xl\f{} to 0.5000"
@ s4 legend "\xD\f{}H \xl\f{} to 1.0000"
@ s5 legend "pV (kJ/mol)"
0.0 -1000.0 12.0 -3.0 0.0 4.0 2.0
0.2 -1001.0 11.0 -2.0 0.0 5.0 2.5
"#;

    const MULTI_LAMBDA: &str = r#"@    xaxis  label "Time (ps)"
@ subtitle "T = 298 (K) \xl\f{} state 0: (coul-lambda, vdw-lambda) = (0.0000, 0.0000)"
@ s0 legend "Potential Energy"
@ s1 legend "dH/d\xl\f{} coul-lambda = 0.0000"
@ s2 legend "dH/d\xl\f{} vdw-lambda = 0.0000"
@ s3 legend "\xD\f{}H \xl\f{} to (0.0000, 0.0000)"
@ s4 legend "\xD\f{}H \xl\f{} to (0.5000, 0.0000)"
0.0 -50.0 1.0 2.0 0.0 0.7
"#;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn u_nk_has_one_column_per_foreign_state() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "dhdl.xvg", SINGLE_LAMBDA);

        let u_nk = extract_u_nk(&path, 300.0).unwrap();
        assert_eq!(
            u_nk.columns(),
            &[
                StateLabel::Scalar(0.0),
                StateLabel::Scalar(0.5),
                StateLabel::Scalar(1.0)
            ]
        );
        assert_eq!(u_nk.num_rows(), 2);
        assert!(f64_approx_equal(
            u_nk.value(0, 2).unwrap(),
            beta(300.0) * (4.0 - 1000.0 + 2.0)
        ));
        assert!(f64_approx_equal(
            u_nk.value(1, 0).unwrap(),
            beta(300.0) * (-2.0 - 1001.0 + 2.5)
        ));
    }

    #[test]
    fn u_nk_index_carries_sampled_state() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "dhdl.xvg", SINGLE_LAMBDA);

        let u_nk = extract_u_nk(&path, 300.0).unwrap();
        assert_eq!(u_nk.index().level_names(), &["fep-lambda"]);
        assert_eq!(u_nk.index().keys()[1].time, 0.2);
        assert_eq!(u_nk.index().keys()[1].state, vec![0.5]);
    }

    #[test]
    fn dhdl_names_value_columns_without_lambda_suffix() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "dhdl.xvg", SINGLE_LAMBDA);

        let dhdl = extract_dhdl(&path, 300.0).unwrap();
        assert_eq!(dhdl.columns(), &["fep"]);
        assert_eq!(dhdl.index().level_names(), &["fep-lambda"]);
        assert!(f64_approx_equal(
            dhdl.value(0, 0).unwrap(),
            beta(300.0) * 12.0
        ));
    }

    #[test]
    fn multi_component_subtitle_gives_tuple_state() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "dhdl.xvg", MULTI_LAMBDA);

        let dhdl = extract_dhdl(&path, 298.0).unwrap();
        assert_eq!(dhdl.columns(), &["coul", "vdw"]);
        assert_eq!(dhdl.index().keys()[0].state, vec![0.0, 0.0]);
        assert!(f64_approx_equal(dhdl.value(0, 1).unwrap(), beta(298.0) * 2.0));

        let u_nk = extract_u_nk(&path, 298.0).unwrap();
        assert_eq!(u_nk.columns()[1], StateLabel::Tuple(vec![0.5, 0.0]));
        assert!(f64_approx_equal(
            u_nk.value(0, 1).unwrap(),
            beta(298.0) * (0.7 - 50.0)
        ));
    }

    #[test]
    fn single_component_selection_matches_legend_substring() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "dhdl.xvg", MULTI_LAMBDA);

        let dhdl = extract_dhdl_component(&path, "vdw-lambda", 298.0).unwrap();
        assert_eq!(dhdl.columns(), &["vdw"]);
        assert!(f64_approx_equal(dhdl.value(0, 0).unwrap(), beta(298.0) * 2.0));

        let err = extract_dhdl_component(&path, "mass-lambda", 298.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingColumn);
    }

    #[test]
    fn state_is_recovered_from_gradient_legends_without_subtitle() {
        let dir = tempdir().unwrap();
        let text = SINGLE_LAMBDA.replace(
            "@ subtitle \"T = 300 (K) \\xl\\f{} state 1: fep-lambda = 0.5000\"\n",
            "",
        );
        let path = write(&dir, "dhdl.xvg", &text);

        let dhdl = extract_dhdl(&path, 300.0).unwrap();
        assert_eq!(dhdl.index().level_names(), &["fep-lambda"]);
        assert_eq!(dhdl.index().keys()[0].state, vec![0.5]);
    }

    #[test]
    fn u_nk_requires_potential_energy_unless_disabled() {
        let dir = tempdir().unwrap();
        let text = SINGLE_LAMBDA.replace("Total Energy", "Kinetic En.");
        let path = write(&dir, "dhdl.xvg", &text);

        let err = extract_u_nk(&path, 300.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingColumn);

        let options = ExtractionOptions::builder()
            .temperature(300.0)
            .include_potential(false)
            .build()
            .unwrap();
        let u_nk = extract_u_nk_with(&path, &options).unwrap();
        assert!(f64_approx_equal(
            u_nk.value(0, 2).unwrap(),
            beta(300.0) * (4.0 + 2.0)
        ));
    }

    #[test]
    fn u_nk_without_differences_or_energy_is_empty() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "dhdl.xvg",
            "@ s0 legend \"dH/d\\xl\\f{} fep-lambda = 0.0000\"\n0.0 1.0\n0.2 1.5\n",
        );

        let u_nk = extract_u_nk(&path, 300.0).unwrap();
        assert_eq!(u_nk.num_columns(), 0);
        assert_eq!(u_nk.num_rows(), 2);
        assert_eq!(extract_dhdl(&path, 300.0).unwrap().num_rows(), 2);
    }

    #[test]
    fn component_selection_honours_custom_rules() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "dhdl.xvg",
            "@ s0 legend \"dVdl restraint-lambda\"\n@ s1 legend \"Total Energy\"\n0.0 4.0 -9.0\n",
        );
        let mut rules = RuleSet::gromacs();
        rules.rules.push(ColumnRule::new(
            RoleKind::Gradient,
            MatchKind::StartsWith,
            "dVdl",
        ));
        let options = ExtractionOptions::builder()
            .temperature(300.0)
            .rules(rules)
            .build()
            .unwrap();

        let dhdl = extract_dhdl_component_with(&path, "restraint-lambda", &options).unwrap();
        assert_eq!(dhdl.columns(), &["restraint"]);
        assert!(f64_approx_equal(dhdl.value(0, 0).unwrap(), beta(300.0) * 4.0));
        assert!(extract_dhdl_component(&path, "restraint-lambda", 300.0).is_err());
    }

    #[test]
    fn generate_source_accepts_mixed_path_types() {
        let dir = tempdir().unwrap();
        let result = generate_source(
            dir.path().join("topol.tpr"),
            "ener.edr",
            dir.path().join("dhdl.xvg").as_path(),
        );
        // Either `gmx` is absent or it fails on the missing inputs.
        assert!(result.is_err());
    }

    #[test]
    fn header_parses_temperature_and_state() {
        let metadata = XvgMetadata {
            subtitle: Some(
                r"T = 310.5 (K) \xl\f{} state 7: (coul-lambda, vdw-lambda) = (1.0000, 0.2500)"
                    .to_string(),
            ),
            ..Default::default()
        };
        let header = parse_header(&metadata).unwrap();
        assert_eq!(header.temperature, Some(310.5));
        let state = header.state.unwrap();
        assert_eq!(state.index, Some(7));
        assert_eq!(state.lambda_names, vec!["coul-lambda", "vdw-lambda"]);
        assert_eq!(state.vector, StateLabel::Tuple(vec![1.0, 0.25]));
    }

    #[test]
    fn header_without_subtitle_is_empty() {
        let header = parse_header(&XvgMetadata::default()).unwrap();
        assert_eq!(header, XvgHeader::default());
    }

    #[test]
    fn malformed_state_in_subtitle_is_an_error() {
        let metadata = XvgMetadata {
            subtitle: Some(r"T = 300 (K) \xl\f{} state 1: fep-lambda = half".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            parse_header(&metadata),
            Err(FormatErrorKind::StateDeclaration { .. })
        ));
    }

    #[test]
    fn generate_source_reports_missing_executable() {
        let dir = tempdir().unwrap();
        let gmx = GmxCommand::new(dir.path().join("no-such-gmx"));
        let result = gmx.energy_to_xvg(
            &dir.path().join("topol.tpr"),
            &dir.path().join("ener.edr"),
            &dir.path().join("dhdl.xvg"),
        );
        assert!(matches!(result, Err(GenerateError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn generate_source_reports_failed_run() {
        let dir = tempdir().unwrap();
        let gmx = GmxCommand::new("false");
        let result = gmx.energy_to_xvg(
            &dir.path().join("topol.tpr"),
            &dir.path().join("ener.edr"),
            &dir.path().join("dhdl.xvg"),
        );
        assert!(matches!(result, Err(GenerateError::Failed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn generate_source_checks_that_output_was_written() {
        let dir = tempdir().unwrap();
        let gmx = GmxCommand::new("true");
        let result = gmx.energy_to_xvg(
            &dir.path().join("topol.tpr"),
            &dir.path().join("ener.edr"),
            &dir.path().join("dhdl.xvg"),
        );
        assert!(matches!(result, Err(GenerateError::MissingOutput { .. })));
    }
}
