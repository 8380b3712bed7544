// flowexec/src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowExecError {
  #[error("Execution session has already been started")]
  AlreadyStarted,

  #[error("Failed to spawn execution thread '{thread_name}'. Source: {source}")]
  Spawn {
    thread_name: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Step already defined: {step_name}")]
  DuplicateStep { step_name: String },

  #[error("Handler missing for enabled step: {step_name}")]
  HandlerMissing { step_name: String },
}

pub type FlowExecResult<T, E = FlowExecError> = std::result::Result<T, E>;
