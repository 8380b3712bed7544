// flowexec/src/session/execution.rs

//! The body of the execution thread: set-up, execution, stop confirmation,
//! outcome mapping and wrap-up.

use crate::breakpoint::PauseBeforeFirstStep;
use crate::session::{ExecutionOutcome, SessionEvent, SessionState, Shared};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{event, instrument, Level};

enum StopConfirmation {
  Confirmed,
  Killed,
  TimedOut,
}

#[instrument(name = "session_execution", skip_all, fields(session_id = shared.id, debug = shared.config.debug))]
pub(crate) fn run(shared: Arc<Shared>) {
  let pipeline = Arc::clone(&shared.pipeline);

  if let Err(message) = guarded(|| {
    pipeline.destroy();
    Ok(())
  }) {
    event!(Level::WARN, error = %message, "Destroying leftovers of a previous run failed.");
  }
  {
    let mut inner = shared.inner.lock();
    inner.emit(SessionEvent::ClearNotification);
    inner.status("Initializing");
  }
  shared.flush();

  let outcome = match guarded(|| pipeline.set_up()) {
    Err(message) => {
      event!(Level::WARN, error = %message, "Pipeline set-up failed, skipping execution.");
      Some(ExecutionOutcome::Error(message))
    }
    Ok(()) => execute(&shared),
  };

  let Some(outcome) = outcome else {
    // Killed: the outcome is already out. Release what we can, silently.
    event!(Level::DEBUG, "Execution thread returned after kill.");
    wrap_up(&shared);
    return;
  };

  shared.inner.lock().status("Finishing up");
  shared.flush();
  wrap_up(&shared);
  shared.finish(outcome, pipeline.logged_error_count());
}

/// Runs the pipeline and maps how it ended. Returns `None` when the session
/// was killed meanwhile.
fn execute(shared: &Shared) -> Option<ExecutionOutcome> {
  let pipeline = &shared.pipeline;

  if let Some(path) = &shared.config.source_path {
    if pipeline.set_source_path(path) {
      event!(Level::DEBUG, path = %path.display(), "Pipeline variables updated from source path.");
    }
  }
  if shared.config.debug {
    attach_debug_breakpoint(shared);
  }

  {
    let _control = shared.control.lock();
    let pausable = pipeline.as_pausable().is_some();
    let deferred = {
      let mut inner = shared.inner.lock();
      if inner.state.is_terminal() {
        return None;
      }
      inner.executing = true;
      inner.status("Running");
      // Requests that arrived during initialization are forwarded now, after
      // set_up could no longer reset them.
      match inner.state {
        SessionState::Stopping => inner.status("Stopping"),
        SessionState::Paused if pausable => inner.status("Pausing"),
        _ => {}
      }
      inner.state
    };
    match deferred {
      SessionState::Stopping => {
        event!(Level::DEBUG, "Forwarding stop requested during initialization.");
        pipeline.request_stop();
      }
      SessionState::Paused => {
        if let Some(pausable) = pipeline.as_pausable() {
          event!(Level::DEBUG, "Forwarding pause requested during initialization.");
          pausable.pause();
        }
      }
      _ => {}
    }
  }
  shared.flush();

  let result = guarded(|| pipeline.execute());
  let state_at_return = {
    let mut inner = shared.inner.lock();
    inner.execute_returned = true;
    inner.state
  };
  event!(Level::DEBUG, state = ?state_at_return, failed = result.is_err(), "Pipeline execute returned.");

  let error = match result {
    Err(message) => Some(message),
    Ok(()) if pipeline.has_stop_message() => Some(pipeline.stop_message().unwrap_or_default()),
    Ok(()) => None,
  };

  match state_at_return {
    SessionState::Terminal => return None,
    SessionState::Stopping => match await_stop_confirmation(shared) {
      StopConfirmation::Confirmed => {}
      StopConfirmation::Killed => return None,
      StopConfirmation::TimedOut => {
        event!(
          Level::WARN,
          timeout = ?shared.config.stop_timeout,
          "Pipeline did not confirm the stop in time, escalating to kill."
        );
        shared.kill();
        return None;
      }
    },
    _ => {}
  }

  Some(match error {
    Some(message) => ExecutionOutcome::Error(message),
    None if state_at_return == SessionState::Stopping => ExecutionOutcome::UserStopped,
    None => ExecutionOutcome::Success,
  })
}

fn attach_debug_breakpoint(shared: &Shared) {
  match shared.pipeline.as_breakpoint_host() {
    Some(host) if host.has_active_units() => {
      host.add_breakpoint(Box::new(PauseBeforeFirstStep::new()));
      event!(Level::DEBUG, "Debug mode: pausing before the first step.");
    }
    Some(_) => event!(Level::DEBUG, "Debug mode: no active steps, no breakpoint attached."),
    None => event!(Level::DEBUG, "Debug mode: pipeline does not host breakpoints."),
  }
}

/// Polls `is_stopped()` until the pipeline confirms it has unwound.
///
/// Unbounded unless `stop_timeout` is configured, in which case the deadline
/// counts from the stop request. A kill ends the wait early (it also unparks
/// this thread).
fn await_stop_confirmation(shared: &Shared) -> StopConfirmation {
  let deadline = shared.stop_deadline();
  let mut polls: u64 = 0;
  loop {
    if shared.pipeline.is_stopped() {
      event!(Level::DEBUG, polls, "Pipeline confirmed stop.");
      return StopConfirmation::Confirmed;
    }
    if shared.state().is_terminal() {
      return StopConfirmation::Killed;
    }
    if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
      return StopConfirmation::TimedOut;
    }
    polls += 1;
    thread::park_timeout(shared.config.stop_poll_interval);
  }
}

fn wrap_up(shared: &Shared) {
  let pipeline = &shared.pipeline;
  if let Err(message) = guarded(|| {
    pipeline.wrap_up();
    Ok(())
  }) {
    event!(Level::ERROR, error = %message, "Pipeline wrap-up failed.");
  }
}

/// Runs a pipeline call, turning both errors and panics into a message.
fn guarded<F>(f: F) -> Result<(), String>
where
  F: FnOnce() -> anyhow::Result<()>,
{
  match panic::catch_unwind(AssertUnwindSafe(f)) {
    Ok(Ok(())) => Ok(()),
    Ok(Err(e)) => Err(format!("{:#}", e)),
    Err(payload) => Err(format!("panic: {}", panic_message(payload.as_ref()))),
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic payload".to_string()
  }
}
