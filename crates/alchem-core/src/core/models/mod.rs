//! Data models shared by every stage of the extraction pipeline.
//!
//! - [`table`] - the raw, engine-agnostic column table produced by the readers
//! - [`state`] - state-vector literals and the window's state descriptor
//! - [`frame`] - row keys, the composite frame index and the labeled output tables

pub mod frame;
pub mod state;
pub mod table;
