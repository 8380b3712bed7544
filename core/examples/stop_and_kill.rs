// flowexec/examples/stop_and_kill.rs

use anyhow::Result;
use flowexec::{ContextData, ExecutionSession, Flow, FlowControl, NullListener, SessionConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

#[derive(Clone, Debug, Default)]
struct PollContext {
  polls: u32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

  // --- Part 1: a cooperative step honors `stop` ---
  info!("--- Cooperative stop ---");
  let ctx = ContextData::new(PollContext::default());
  let mut flow = Flow::new(ctx.clone(), &[("poll_sensor", true)]);
  flow.on("poll_sensor", |scope| {
    // Wakes early when the session asks the flow to stop.
    while scope.sleep(Duration::from_millis(50)) {
      scope.data().write().polls += 1;
    }
    Ok(FlowControl::Continue)
  })?;

  let session = ExecutionSession::new(
    Arc::new(flow),
    Arc::new(NullListener),
    SessionConfig::default().with_stop_poll_interval(Duration::from_millis(10)),
  );
  session.start()?;
  thread::sleep(Duration::from_millis(220));
  session.stop();
  let outcome = session.wait();
  info!(%outcome, polls = ctx.read().polls, "Cooperative stop done.");

  // --- Part 2: a step that ignores `stop` can only be killed ---
  info!("--- Kill ---");
  let release = Arc::new(AtomicBool::new(false));
  let step_release = release.clone();
  let mut stubborn = Flow::new(ContextData::new(PollContext::default()), &[("busy_loop", true)]);
  stubborn.on("busy_loop", move |_scope| {
    // Never checks for a stop request.
    while !step_release.load(Ordering::SeqCst) {
      thread::sleep(Duration::from_millis(5));
    }
    Ok(FlowControl::Continue)
  })?;

  let session = ExecutionSession::new(Arc::new(stubborn), Arc::new(NullListener), SessionConfig::default());
  session.start()?;
  thread::sleep(Duration::from_millis(50));

  session.stop();
  if session.wait_timeout(Duration::from_millis(300)).is_none() {
    info!("Flow ignores the stop request, killing it.");
    session.kill();
  }
  let outcome = session.wait();
  info!(%outcome, "Stubborn flow done.");

  // The abandoned execution thread is still inside the step; let it go.
  release.store(true, Ordering::SeqCst);
  Ok(())
}
