//! # alchemrs
//!
//! Extraction of alchemical free-energy observables from molecular dynamics output.
//!
//! The library turns raw engine output into the two tables free-energy estimators
//! consume: the reduced potential matrix `u_nk` (for BAR/MBAR) and the
//! dimensionless Hamiltonian gradient series `dH/dl` (for TI).
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Data models (`RawTable`, `StateLabel`, `FrameIndex`),
//!   the per-format table readers, the rule-driven column classifier, and the
//!   arithmetic that assembles reduced potentials and gradients.
//!
//! - **[`parsing`]: The Public API.** One module per supported engine (GROMACS,
//!   GOMC), each wiring reader, classifier, assembler and index builder into
//!   `extract_u_nk` / `extract_dhdl`, plus extraction options and a parallel
//!   batch helper.

pub mod core;
pub mod parsing;
