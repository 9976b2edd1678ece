use crate::core::error::ParseError;
use crate::core::models::frame::{GradientSeries, ReducedPotentialMatrix};
use crate::parsing::options::ExtractionOptions;
use crate::parsing::{gmx, gomc};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The simulation engine that wrote a set of files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Gromacs,
    Gomc,
}

impl Engine {
    pub fn extract_u_nk(
        self,
        path: &Path,
        options: &ExtractionOptions,
    ) -> Result<ReducedPotentialMatrix, ParseError> {
        match self {
            Engine::Gromacs => gmx::extract_u_nk_with(path, options),
            Engine::Gomc => gomc::extract_u_nk_with(path, options),
        }
    }

    pub fn extract_dhdl(
        self,
        path: &Path,
        options: &ExtractionOptions,
    ) -> Result<GradientSeries, ParseError> {
        match self {
            Engine::Gromacs => gmx::extract_dhdl_with(path, options),
            Engine::Gomc => gomc::extract_dhdl_with(path, options),
        }
    }
}

/// Outcome of extracting one file of a batch.
#[derive(Debug)]
pub struct BatchItem<T> {
    pub path: PathBuf,
    pub result: Result<T, ParseError>,
}

/// Extracts `u_nk` from every file in `paths`.
///
/// Results come back in input order; a failing file does not stop the others.
#[instrument(skip_all, name = "batch_u_nk", fields(files = paths.len()))]
pub fn extract_u_nk_many<P: AsRef<Path> + Sync>(
    paths: &[P],
    engine: Engine,
    options: &ExtractionOptions,
) -> Vec<BatchItem<ReducedPotentialMatrix>> {
    run(paths, |path| engine.extract_u_nk(path, options))
}

/// Extracts `dH/dl` from every file in `paths`, in input order.
#[instrument(skip_all, name = "batch_dhdl", fields(files = paths.len()))]
pub fn extract_dhdl_many<P: AsRef<Path> + Sync>(
    paths: &[P],
    engine: Engine,
    options: &ExtractionOptions,
) -> Vec<BatchItem<GradientSeries>> {
    run(paths, |path| engine.extract_dhdl(path, options))
}

fn run<P, T, F>(paths: &[P], extract: F) -> Vec<BatchItem<T>>
where
    P: AsRef<Path> + Sync,
    T: Send,
    F: Fn(&Path) -> Result<T, ParseError> + Sync,
{
    #[cfg(not(feature = "parallel"))]
    let iterator = paths.iter();

    #[cfg(feature = "parallel")]
    let iterator = paths.par_iter();

    let items: Vec<BatchItem<T>> = iterator
        .map(|path| {
            let path = path.as_ref();
            BatchItem {
                path: path.to_path_buf(),
                result: extract(path),
            }
        })
        .collect();

    let mut failed = 0;
    for item in &items {
        if let Err(e) = &item.result {
            warn!("Extraction failed for '{}': {}", item.path.display(), e);
            failed += 1;
        }
    }
    info!(
        succeeded = items.len() - failed,
        failed, "Batch extraction finished."
    );
    items
}
