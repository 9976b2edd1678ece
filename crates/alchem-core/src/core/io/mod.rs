//! Raw table readers for the supported engine output formats.
//!
//! Each reader turns a file into a [`RawTable`](crate::core::models::table::RawTable)
//! plus format-specific metadata through the common [`traits::TableSource`]
//! interface. Readers only split and parse; deciding what a column means is
//! left to the classifier.

pub mod gomc;
pub mod traits;
pub mod xvg;
