// flowexec/src/session/mod.rs

//! Defines `ExecutionSession`: one run of a [`Pipeline`] on a dedicated
//! execution thread, with pause, cooperative stop and forced kill requests
//! arriving concurrently from other threads.
//!
//! The session keeps a single lock-guarded [`SessionState`] and an ordered
//! queue of owner events next to it. Every transition and every event it
//! produces is decided under that lock; events are delivered to the
//! [`SessionListener`] after the lock is released, in production order.

pub mod config;
pub mod listener;
pub mod outcome;
pub mod state;

mod control;
mod dispatch;
mod execution;

pub use config::SessionConfig;
pub use listener::{NullListener, SessionListener};
pub use outcome::{ExecutionOutcome, Severity};
pub use state::SessionState;

use crate::error::{FlowExecError, FlowExecResult};
use crate::pipeline::Pipeline;
use parking_lot::{Condvar, Mutex, ReentrantMutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use tracing::{event, instrument, Level};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) enum SessionEvent {
  Status(String),
  ClearNotification,
  Notify { message: String, outcome: ExecutionOutcome },
  Finished(ExecutionOutcome),
}

/// State guarded by the session lock.
pub(crate) struct Inner {
  pub(crate) state: SessionState,
  /// Set once the execution thread is about to enter `execute()`. A stop
  /// arriving before that is reported by the execution thread itself.
  pub(crate) executing: bool,
  /// Set once `execute()` has returned; a pending stop is then confirmed by
  /// the execution thread.
  pub(crate) execute_returned: bool,
  pub(crate) stop_requested_at: Option<Instant>,
  pub(crate) outcome: Option<ExecutionOutcome>,
  queue: VecDeque<SessionEvent>,
}

impl Inner {
  fn new() -> Self {
    Self {
      state: SessionState::Idle,
      executing: false,
      execute_returned: false,
      stop_requested_at: None,
      outcome: None,
      queue: VecDeque::new(),
    }
  }

  /// Queues an event unless the session is already terminal.
  pub(crate) fn emit(&mut self, event: SessionEvent) {
    if !self.state.is_terminal() {
      self.queue.push_back(event);
    }
  }

  pub(crate) fn status(&mut self, text: impl Into<String>) {
    self.emit(SessionEvent::Status(text.into()));
  }
}

pub(crate) struct Shared {
  pub(crate) id: u64,
  pub(crate) pipeline: Arc<dyn Pipeline>,
  pub(crate) listener: Arc<dyn SessionListener>,
  pub(crate) config: SessionConfig,
  pub(crate) inner: Mutex<Inner>,
  /// Serializes forwarding of control requests to the pipeline. Pipeline
  /// hooks run with only this held, so they may query or control the session.
  pub(crate) control: ReentrantMutex<()>,
  /// Held by whichever thread is currently delivering queued events.
  delivery: Mutex<()>,
  delivered: Mutex<Option<ExecutionOutcome>>,
  delivered_cv: Condvar,
  /// Thread currently running `SessionListener::finished`.
  finishing: Mutex<Option<ThreadId>>,
  pub(crate) worker: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
  pub(crate) fn state(&self) -> SessionState {
    self.inner.lock().state
  }

  /// Records the terminal outcome and queues the final status, the optional
  /// notification and the `finished` callback. First writer wins: returns
  /// false, without any effect, if an outcome was already decided.
  pub(crate) fn finish(&self, outcome: ExecutionOutcome, logged_errors: Option<usize>) -> bool {
    let summary = outcome.summary(logged_errors);
    {
      let mut inner = self.inner.lock();
      if inner.state.is_terminal() {
        event!(Level::DEBUG, session_id = self.id, discarded = ?outcome, "Outcome already decided, discarding.");
        return false;
      }
      inner.status(summary.clone());
      if self.config.notify {
        let message = match &outcome {
          ExecutionOutcome::Error(message) => message.clone(),
          _ => summary,
        };
        inner.emit(SessionEvent::Notify {
          message,
          outcome: outcome.clone(),
        });
      }
      inner.emit(SessionEvent::Finished(outcome.clone()));
      inner.state = SessionState::Terminal;
      inner.outcome = Some(outcome.clone());
    }
    event!(Level::INFO, session_id = self.id, outcome = ?outcome, "Session terminated.");
    self.flush();
    true
  }
}

/// Runs one [`Pipeline`] on a dedicated thread and coordinates pause, stop and
/// kill requests from other threads.
///
/// The handle is cheap to clone; all clones control the same session, so it
/// can be moved into other threads or tasks that issue control operations.
///
/// A session runs exactly once. A new run needs a new session and a pipeline
/// that is not driven by any other session at the same time.
///
/// ```no_run
/// use flowexec::{ContextData, ExecutionSession, Flow, FlowControl, NullListener, SessionConfig};
/// use std::sync::Arc;
///
/// let mut flow = Flow::new(ContextData::new(0u32), &[("count", true)]);
/// flow
///   .on("count", |scope| {
///     *scope.data().write() += 1;
///     Ok(FlowControl::Continue)
///   })
///   .unwrap();
///
/// let session = ExecutionSession::new(Arc::new(flow), Arc::new(NullListener), SessionConfig::default());
/// session.start().unwrap();
/// let outcome = session.wait();
/// assert!(outcome.is_success());
/// ```
#[derive(Clone)]
pub struct ExecutionSession {
  shared: Arc<Shared>,
}

impl std::fmt::Debug for ExecutionSession {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ExecutionSession")
      .field("id", &self.shared.id)
      .field("state", &self.shared.state())
      .field("config", &self.shared.config)
      .finish()
  }
}

impl ExecutionSession {
  pub fn new(pipeline: Arc<dyn Pipeline>, listener: Arc<dyn SessionListener>, config: SessionConfig) -> Self {
    let shared = Shared {
      id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
      pipeline,
      listener,
      config,
      inner: Mutex::new(Inner::new()),
      control: ReentrantMutex::new(()),
      delivery: Mutex::new(()),
      delivered: Mutex::new(None),
      delivered_cv: Condvar::new(),
      finishing: Mutex::new(None),
      worker: Mutex::new(None),
    };
    Self {
      shared: Arc::new(shared),
    }
  }

  /// Starts the run on a new execution thread and returns immediately.
  ///
  /// Returns [`FlowExecError::AlreadyStarted`] on any call after the first.
  /// If the thread cannot be spawned the session terminates with an
  /// [`ExecutionOutcome::Error`] and [`FlowExecError::Spawn`] is returned.
  #[instrument(name = "ExecutionSession::start", skip_all, fields(session_id = self.shared.id), err(Display))]
  pub fn start(&self) -> FlowExecResult<()> {
    {
      let mut inner = self.shared.inner.lock();
      if inner.state != SessionState::Idle {
        return Err(FlowExecError::AlreadyStarted);
      }
      inner.state = SessionState::Running;
    }

    let thread_name = self.shared.config.thread_name.clone();
    let shared = Arc::clone(&self.shared);
    let spawned = thread::Builder::new()
      .name(thread_name.clone())
      .spawn(move || execution::run(shared));

    match spawned {
      Ok(handle) => {
        *self.shared.worker.lock() = Some(handle);
        event!(Level::DEBUG, thread = %thread_name, "Execution thread spawned.");
        Ok(())
      }
      Err(source) => {
        event!(Level::ERROR, error = %source, "Failed to spawn execution thread.");
        self
          .shared
          .finish(ExecutionOutcome::Error(format!("failed to spawn execution thread: {}", source)), None);
        Err(FlowExecError::Spawn { thread_name, source })
      }
    }
  }

  pub fn id(&self) -> u64 {
    self.shared.id
  }

  pub fn config(&self) -> &SessionConfig {
    &self.shared.config
  }

  /// Point-in-time snapshot of the session state.
  pub fn state(&self) -> SessionState {
    self.shared.state()
  }

  /// Running or paused.
  pub fn is_running(&self) -> bool {
    self.state().is_active()
  }

  pub fn is_stopping(&self) -> bool {
    self.state() == SessionState::Stopping
  }

  /// Paused by request, or running with the pipeline paused at a breakpoint.
  pub fn is_paused(&self) -> bool {
    match self.state() {
      SessionState::Paused => true,
      SessionState::Running => self.pipeline_paused(),
      _ => false,
    }
  }

  pub fn is_finished(&self) -> bool {
    self.state().is_terminal()
  }

  /// The terminal outcome, once decided.
  pub fn outcome(&self) -> Option<ExecutionOutcome> {
    self.shared.inner.lock().outcome.clone()
  }

  /// Blocks until the terminal outcome has been delivered to the listener.
  ///
  /// Called from within [`SessionListener::finished`] it returns the outcome
  /// being delivered.
  pub fn wait(&self) -> ExecutionOutcome {
    self.shared.wait_delivered()
  }

  /// Like [`wait`](Self::wait), giving up after `timeout`.
  pub fn wait_timeout(&self, timeout: Duration) -> Option<ExecutionOutcome> {
    self.shared.wait_delivered_for(timeout)
  }

  fn pipeline_paused(&self) -> bool {
    self
      .shared
      .pipeline
      .as_pausable()
      .map_or(false, |pausable| pausable.is_paused())
  }
}
