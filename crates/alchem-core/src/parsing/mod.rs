//! # Parsing Module
//!
//! User-facing extraction entry points, one submodule per supported engine.
//!
//! - [`gmx`] - GROMACS `dhdl.xvg` files written by `gmx energy -odh` or `mdrun -dhdl`
//! - [`gomc`] - GOMC free-energy `.dat` files
//! - [`options`] - temperature, optional energy contributions and custom column rules
//! - [`batch`] - parallel extraction over many files with per-file results
//!
//! Every extraction reads one file to completion and returns an owned,
//! immutable table; nothing is cached between calls.

pub mod batch;
pub mod gmx;
pub mod gomc;
pub mod options;
mod pipeline;
