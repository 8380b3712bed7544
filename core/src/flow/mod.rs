// flowexec/src/flow/mod.rs

//! Defines `Flow<TData>`, a pipeline of ordered, named steps, its
//! construction, and its execution logic.

pub mod definition;
pub mod execution;
pub mod scope;
pub(crate) mod signals;

pub use definition::{Flow, FLOW_DIR_VARIABLE, FLOW_FILENAME_VARIABLE};
pub use scope::{Handler, StepScope};
