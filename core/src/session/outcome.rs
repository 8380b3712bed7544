// flowexec/src/session/outcome.rs

//! Defines the terminal `ExecutionOutcome` of a session and the `Severity`
//! an owner may attach to it when notifying a user.

use std::fmt;

/// Result of one execution attempt. Decided exactly once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
  /// The pipeline ran to completion.
  Success,
  /// Set-up or execution failed, or the pipeline halted itself. Carries the
  /// error or stop message.
  Error(String),
  /// The pipeline ended because of a `stop` request.
  UserStopped,
  /// The execution thread was abandoned by `kill`; the pipeline's shutdown
  /// sequence may not have run.
  Killed,
}

impl ExecutionOutcome {
  pub fn is_success(&self) -> bool {
    matches!(self, ExecutionOutcome::Success)
  }

  pub fn error_message(&self) -> Option<&str> {
    match self {
      ExecutionOutcome::Error(message) => Some(message),
      _ => None,
    }
  }

  /// The final status line for this outcome, optionally suffixed with the
  /// number of errors the pipeline logged.
  pub fn summary(&self, logged_errors: Option<usize>) -> String {
    let errors = logged_errors
      .filter(|count| *count > 0)
      .map(|count| format!("{} error(s) logged", count));

    match (self, errors) {
      (ExecutionOutcome::Error(message), Some(errors)) => {
        format!("Finished with error: {} ({})", message, errors)
      }
      (ExecutionOutcome::Error(message), None) => format!("Finished with error: {}", message),
      (other, Some(errors)) => format!("{} {}.", other, errors),
      (other, None) => other.to_string(),
    }
  }
}

impl fmt::Display for ExecutionOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExecutionOutcome::Success => f.write_str("Flow finished."),
      ExecutionOutcome::Error(message) => write!(f, "Finished with error: {}", message),
      ExecutionOutcome::UserStopped => f.write_str("User stopped flow."),
      ExecutionOutcome::Killed => f.write_str("Flow killed."),
    }
  }
}

/// How prominently an owner should present a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Plain,
  Attention,
}

impl Severity {
  /// The reference mapping: anything but a success needs attention,
  /// including a user-requested stop.
  pub fn for_outcome(outcome: &ExecutionOutcome) -> Self {
    match outcome {
      ExecutionOutcome::Success => Severity::Plain,
      ExecutionOutcome::Error(_) | ExecutionOutcome::UserStopped | ExecutionOutcome::Killed => Severity::Attention,
    }
  }
}
