pub mod context_data;
pub mod control;
pub mod step;

// Re-export key types for easier access from other flowexec modules (and lib.rs)
pub use context_data::ContextData;
pub use control::FlowControl;
pub use step::{StepDef, StepInfo};
