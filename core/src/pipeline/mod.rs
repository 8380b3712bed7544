// flowexec/src/pipeline/mod.rs

//! Defines the `Pipeline` contract and its optional capabilities.

pub mod traits;

pub use traits::{BreakpointHost, Pausable, Pipeline};
