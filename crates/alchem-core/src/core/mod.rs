//! # Core Module
//!
//! Building blocks of the extraction pipeline. Data flows in one direction:
//!
//! 1. **Raw Table Reader** ([`io`]) - engine file bytes to a [`models::table::RawTable`]
//! 2. **Column Classifier** ([`classify`]) - column names to typed roles
//! 3. **Reduced-Potential Assembler** ([`assemble`]) - β-scaled u_nk and dH/dl columns
//! 4. **Index Builder** ([`index`]) - time and state-vector row keys
//!
//! No state is shared between files; every stage is a pure transform of its input.

pub mod assemble;
pub mod classify;
pub mod error;
pub mod index;
pub mod io;
pub mod models;
pub mod units;
