// flowexec/examples/debug_breakpoint.rs

use anyhow::Result;
use flowexec::{
  BreakpointHost, ContextData, ExecutionSession, Flow, FlowControl, NullListener, SessionConfig, StepBreakpoint,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

#[derive(Clone, Debug, Default)]
struct BuildContext {
  artifacts: Vec<String>,
}

fn wait_for_pause(session: &ExecutionSession) {
  while !session.is_paused() && !session.is_finished() {
    thread::sleep(Duration::from_millis(5));
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Debug Mode and Breakpoints Example ---");

  let ctx = ContextData::new(BuildContext::default());
  let mut flow = Flow::new(ctx.clone(), &[("compile", true), ("link", true), ("package", true)]);
  for step in ["compile", "link", "package"] {
    flow.on(step, move |scope| {
      scope.data().write().artifacts.push(format!("{}.out", step));
      Ok(FlowControl::Continue)
    })?;
  }

  // Also stop after "link" to inspect its output.
  flow.add_breakpoint(Box::new(StepBreakpoint::after("link").once()));

  let session = ExecutionSession::new(
    Arc::new(flow),
    Arc::new(NullListener),
    SessionConfig::default().with_debug(true),
  );
  session.start()?;

  // Debug mode: the flow waits before its first step.
  wait_for_pause(&session);
  info!(artifacts = ?ctx.read().artifacts, "Paused before first step.");
  session.resume();

  wait_for_pause(&session);
  info!(artifacts = ?ctx.read().artifacts, "Paused after 'link'.");
  session.resume();

  let outcome = session.wait();
  info!(%outcome, artifacts = ?ctx.read().artifacts, "Done.");
  Ok(())
}
