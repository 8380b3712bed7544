// flowexec/examples/basic_session.rs

use flowexec::{
  ContextData, ExecutionOutcome, ExecutionSession, Flow, FlowControl, FlowExecError, SessionConfig, SessionListener,
  Severity,
};
use std::sync::Arc;
use tracing::{info, warn};

// 1. Define Context Data
#[derive(Clone, Debug, Default)]
struct ImportContext {
  rows_read: usize,
  rows_written: usize,
  log: Vec<String>,
}

// 2. A listener that prints what a UI would show
struct ConsoleListener;

impl SessionListener for ConsoleListener {
  fn status(&self, text: &str) {
    info!(status = text, "Status changed.");
  }

  fn notify(&self, message: &str, severity: Severity) {
    match severity {
      Severity::Plain => info!("Notification: {}", message),
      Severity::Attention => warn!("Notification (attention): {}", message),
    }
  }

  fn finished(&self, outcome: &ExecutionOutcome) {
    info!(?outcome, "Session finished.");
  }
}

fn main() -> Result<(), FlowExecError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Basic Session Example ---");

  // 3. Create the Flow definition
  let ctx = ContextData::new(ImportContext::default());
  let mut flow = Flow::new(
    ctx.clone(),
    &[("read_rows", true), ("validate", true), ("write_rows", true), ("archive", false)],
  );

  // 4. Register Handlers
  flow.on("read_rows", |scope| {
    let mut data = scope.data().write();
    data.rows_read = 42;
    data.log.push("read 42 rows".to_string());
    Ok(FlowControl::Continue)
  })?;

  flow.on("validate", |scope| {
    // Non-fatal problems are logged and counted in the final status.
    scope.log_error("row 17: missing customer id");
    Ok(FlowControl::Continue)
  })?;

  flow.on("write_rows", |scope| {
    let mut data = scope.data().write();
    data.rows_written = data.rows_read - 1;
    let entry = format!("wrote {} rows", data.rows_written);
    data.log.push(entry);
    Ok(FlowControl::Continue)
  })?;

  // "archive" is disabled and needs no handler.

  // 5. Run it in a session
  let config = SessionConfig::default()
    .with_notify(true)
    .with_source_path("/var/flows/customer_import.flow");
  let session = ExecutionSession::new(Arc::new(flow), Arc::new(ConsoleListener), config);
  session.start()?;

  let outcome = session.wait();
  info!(?outcome, "Final outcome.");

  let final_ctx = ctx.read();
  info!(log = ?final_ctx.log, "Flow log.");
  assert!(outcome.is_success());
  assert_eq!(final_ctx.rows_written, 41);

  Ok(())
}
