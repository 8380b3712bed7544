// tests/outcome_tests.rs
mod common;

use common::*;
use flowexec::{ExecutionOutcome, FlowExecError, SessionConfig, SessionState, Severity};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_outcome_display_texts() {
  assert_eq!(ExecutionOutcome::Success.to_string(), "Flow finished.");
  assert_eq!(ExecutionOutcome::UserStopped.to_string(), "User stopped flow.");
  assert_eq!(ExecutionOutcome::Killed.to_string(), "Flow killed.");
  assert_eq!(
    ExecutionOutcome::Error("no input".to_string()).to_string(),
    "Finished with error: no input"
  );
}

#[test]
fn test_summary_appends_logged_error_count() {
  setup_tracing();
  assert_eq!(ExecutionOutcome::Success.summary(None), "Flow finished.");
  assert_eq!(ExecutionOutcome::Success.summary(Some(0)), "Flow finished.");
  assert_eq!(
    ExecutionOutcome::Success.summary(Some(3)),
    "Flow finished. 3 error(s) logged."
  );
  assert_eq!(
    ExecutionOutcome::UserStopped.summary(Some(1)),
    "User stopped flow. 1 error(s) logged."
  );
  assert_eq!(
    ExecutionOutcome::Error("bad row".to_string()).summary(Some(2)),
    "Finished with error: bad row (2 error(s) logged)"
  );
}

#[test]
fn test_outcome_accessors() {
  assert!(ExecutionOutcome::Success.is_success());
  assert!(!ExecutionOutcome::Killed.is_success());
  assert_eq!(ExecutionOutcome::Error("x".to_string()).error_message(), Some("x"));
  assert_eq!(ExecutionOutcome::UserStopped.error_message(), None);
}

#[test]
fn test_default_severity_only_plain_for_success() {
  assert_eq!(Severity::for_outcome(&ExecutionOutcome::Success), Severity::Plain);
  assert_eq!(Severity::for_outcome(&ExecutionOutcome::UserStopped), Severity::Attention);
  assert_eq!(Severity::for_outcome(&ExecutionOutcome::Killed), Severity::Attention);
  assert_eq!(
    Severity::for_outcome(&ExecutionOutcome::Error("x".to_string())),
    Severity::Attention
  );
}

#[test]
fn test_session_state_predicates() {
  assert!(SessionState::Running.is_active());
  assert!(SessionState::Paused.is_active());
  assert!(!SessionState::Stopping.is_active());
  assert!(!SessionState::Idle.is_active());
  assert!(SessionState::Terminal.is_terminal());
  assert!(!SessionState::Stopping.is_terminal());
}

#[test]
fn test_config_defaults_and_builders() {
  let config = SessionConfig::default();
  assert!(!config.debug);
  assert!(!config.notify);
  assert_eq!(config.source_path, None);
  assert_eq!(config.stop_poll_interval, Duration::from_millis(100));
  assert_eq!(config.stop_timeout, None);
  assert_eq!(config.thread_name, "flow-execution");

  let config = config
    .with_debug(true)
    .with_notify(true)
    .with_source_path("/tmp/a.flow")
    .with_stop_poll_interval(Duration::from_millis(10))
    .with_stop_timeout(Duration::from_secs(2))
    .with_thread_name("nightly-import");
  assert!(config.debug);
  assert!(config.notify);
  assert_eq!(config.source_path, Some(PathBuf::from("/tmp/a.flow")));
  assert_eq!(config.stop_poll_interval, Duration::from_millis(10));
  assert_eq!(config.stop_timeout, Some(Duration::from_secs(2)));
  assert_eq!(config.thread_name, "nightly-import");
}

#[test]
fn test_error_messages() {
  assert_eq!(
    FlowExecError::AlreadyStarted.to_string(),
    "Execution session has already been started"
  );
  assert_eq!(
    FlowExecError::StepNotFound {
      step_name: "x".to_string()
    }
    .to_string(),
    "Step not found: x"
  );
}
