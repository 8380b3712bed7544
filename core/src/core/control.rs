// flowexec/src/core/control.rs

//! Defines the signal a step handler returns to steer the rest of its flow.

/// Signal from a step handler indicating how the flow should proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowControl {
  /// Continue with the next step.
  Continue,
  /// End the flow early without error. Remaining steps are not executed and
  /// the run counts as finished normally.
  Stop,
  /// End the flow and record a stop message, the way a critical actor halts
  /// the whole flow. The session reports this as an error carrying the message.
  Halt(String),
}

impl FlowControl {
  /// Convenience constructor for [`FlowControl::Halt`].
  pub fn halt(message: impl Into<String>) -> Self {
    FlowControl::Halt(message.into())
  }
}
