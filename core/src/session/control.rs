// flowexec/src/session/control.rs

//! Control operations of an `ExecutionSession`: pause, resume, stop and kill.
//!
//! All of them are safe to call from any thread at any time. Pipeline hooks
//! are called after the state lock is released, so a hook may query or
//! control the session. Each returns whether the request was applied; calls that
//! do not fit the current state (including every call after termination)
//! are no-ops returning `false`.

use crate::session::{ExecutionOutcome, ExecutionSession, SessionState, Shared};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{event, instrument, Level};

impl ExecutionSession {
  /// Pauses a running session. No-op unless the pipeline is
  /// [`Pausable`](crate::Pausable) and the session is `Running`.
  #[instrument(name = "ExecutionSession::pause", skip_all, fields(session_id = self.shared.id))]
  pub fn pause(&self) -> bool {
    let Some(pausable) = self.shared.pipeline.as_pausable() else {
      event!(Level::DEBUG, "Pipeline is not pausable, ignoring pause.");
      return false;
    };
    let _control = self.shared.control.lock();
    let forward = {
      let mut inner = self.shared.inner.lock();
      if inner.state != SessionState::Running {
        event!(Level::DEBUG, state = ?inner.state, "Ignoring pause.");
        return false;
      }
      inner.state = SessionState::Paused;
      // Before execution starts the execution thread forwards the pause.
      if inner.executing {
        inner.status("Pausing");
      }
      inner.executing
    };
    if forward {
      pausable.pause();
    }
    self.shared.flush();
    true
  }

  /// Resumes a paused session, or a running one whose pipeline stopped at a
  /// breakpoint. No-op unless the pipeline is [`Pausable`](crate::Pausable).
  #[instrument(name = "ExecutionSession::resume", skip_all, fields(session_id = self.shared.id))]
  pub fn resume(&self) -> bool {
    let Some(pausable) = self.shared.pipeline.as_pausable() else {
      event!(Level::DEBUG, "Pipeline is not pausable, ignoring resume.");
      return false;
    };
    let _control = self.shared.control.lock();
    let pipeline_paused = pausable.is_paused();
    let forward = {
      let mut inner = self.shared.inner.lock();
      let at_breakpoint = inner.state == SessionState::Running && inner.executing && pipeline_paused;
      if inner.state != SessionState::Paused && !at_breakpoint {
        event!(Level::DEBUG, state = ?inner.state, "Ignoring resume.");
        return false;
      }
      inner.state = SessionState::Running;
      if inner.executing {
        inner.status("Resuming");
      }
      inner.executing
    };
    if forward {
      pausable.resume();
    }
    self.shared.flush();
    true
  }

  /// Requests a cooperative stop and returns immediately.
  ///
  /// The pipeline is asked to stop at its next safe point; the execution
  /// thread then waits for it to confirm (see
  /// [`SessionConfig::stop_timeout`](crate::SessionConfig::stop_timeout))
  /// and reports [`ExecutionOutcome::UserStopped`]. Repeated calls while
  /// stopping have no further effect.
  #[instrument(name = "ExecutionSession::stop", skip_all, fields(session_id = self.shared.id))]
  pub fn stop(&self) -> bool {
    let _control = self.shared.control.lock();
    let forward = {
      let mut inner = self.shared.inner.lock();
      if !inner.state.is_active() {
        event!(Level::DEBUG, state = ?inner.state, "Ignoring stop.");
        return false;
      }
      inner.state = SessionState::Stopping;
      inner.stop_requested_at = Some(Instant::now());
      // Before execution starts the execution thread forwards the stop.
      if inner.executing {
        inner.status("Stopping");
      }
      inner.executing
    };
    if forward {
      self.shared.pipeline.request_stop();
    }
    event!(Level::INFO, "Stop requested.");
    self.shared.flush();
    if let Some(timeout) = self.shared.config.stop_timeout {
      self.shared.watch_stop_deadline(timeout);
    }
    true
  }

  /// Forcibly terminates the session and immediately reports
  /// [`ExecutionOutcome::Killed`].
  ///
  /// # Danger
  ///
  /// Rust offers no safe way to abort a thread. `kill` asks the pipeline to
  /// stop, wakes the execution thread and then abandons it: the thread is
  /// detached and keeps running until the pipeline returns on its own, if
  /// ever. No wrap-up is awaited, so the pipeline's resources must be treated
  /// as leaked or inconsistent. Use only for pipelines that ignore
  /// [`stop`](Self::stop).
  #[instrument(name = "ExecutionSession::kill", skip_all, fields(session_id = self.shared.id))]
  pub fn kill(&self) -> bool {
    self.shared.kill()
  }
}

impl Shared {
  pub(crate) fn kill(&self) -> bool {
    {
      let inner = self.inner.lock();
      if matches!(inner.state, SessionState::Idle | SessionState::Terminal) {
        event!(Level::DEBUG, state = ?inner.state, "Ignoring kill.");
        return false;
      }
    }
    self.pipeline.request_stop();

    if let Some(handle) = self.worker.lock().take() {
      handle.thread().unpark();
      event!(
        Level::WARN,
        session_id = self.id,
        thread = ?handle.thread().name(),
        "Abandoning execution thread; pipeline resources may be left inconsistent."
      );
      // Dropping the handle detaches the thread.
      drop(handle);
    }

    self.finish(ExecutionOutcome::Killed, None)
  }

  /// Spawns a watchdog that kills the session if it is still stopping inside
  /// `execute()` once `timeout` has passed since the stop request. After
  /// `execute()` returns, the confirmation wait enforces the same deadline.
  fn watch_stop_deadline(self: &Arc<Self>, timeout: Duration) {
    let shared = Arc::clone(self);
    let spawned = thread::Builder::new()
      .name(format!("{}-stop-watchdog", self.config.thread_name))
      .spawn(move || {
        let Some(deadline) = shared.stop_deadline() else {
          return;
        };
        loop {
          {
            let inner = shared.inner.lock();
            if inner.state != SessionState::Stopping || inner.execute_returned {
              return;
            }
          }
          let now = Instant::now();
          if now >= deadline {
            break;
          }
          thread::park_timeout((deadline - now).min(shared.config.stop_poll_interval));
        }
        event!(
          Level::WARN,
          session_id = shared.id,
          ?timeout,
          "Pipeline did not return from execute in time after stop, escalating to kill."
        );
        shared.kill();
      });
    if let Err(e) = spawned {
      event!(Level::ERROR, session_id = self.id, error = %e, "Failed to spawn stop watchdog.");
    }
  }

  /// When the pending stop request must be confirmed by, if bounded.
  pub(crate) fn stop_deadline(&self) -> Option<Instant> {
    let timeout = self.config.stop_timeout?;
    self.inner.lock().stop_requested_at.map(|requested| requested + timeout)
  }
}
