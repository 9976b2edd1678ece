//! Column classification.
//!
//! Engine output encodes the meaning of each column in its name. This module
//! turns those names into typed roles through an ordered list of
//! `(role, matcher)` rules ([`rules`]), evaluated once per file by the
//! [`classifier`]. Single-valued roles that are absent come back as `None`
//! instead of being silently dropped.

pub mod classifier;
pub mod rules;
