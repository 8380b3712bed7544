// flowexec/src/pipeline/traits.rs

//! Defines the `Pipeline` trait the execution session drives, and the
//! optional capabilities a pipeline may expose.
//!
//! Capabilities are discovered through explicit query methods
//! ([`Pipeline::as_pausable`], [`Pipeline::as_breakpoint_host`]) rather than
//! by downcasting, so a pipeline opts into pause/resume or breakpoint support
//! by overriding the matching method to return `Some(self)`.

use crate::breakpoint::Breakpoint;
use std::path::Path;

/// A runnable unit whose lifecycle is driven by an
/// [`ExecutionSession`](crate::ExecutionSession).
///
/// All methods take `&self`: the session calls [`execute`](Pipeline::execute)
/// on its own execution thread while control operations such as
/// [`request_stop`](Pipeline::request_stop) arrive concurrently from other
/// threads. Implementations keep their run flags behind atomics or locks.
///
/// Lifecycle of one run: `destroy` (leftovers of a previous run), `set_up`,
/// `execute`, `wrap_up`.
pub trait Pipeline: Send + Sync {
  /// Prepares the pipeline. Called once per run, before `execute`.
  /// An error here means `execute` is never called.
  fn set_up(&self) -> anyhow::Result<()>;

  /// Runs to completion, or until a cooperative stop or a self-halt makes it
  /// return early. Blocking.
  fn execute(&self) -> anyhow::Result<()>;

  /// Releases resources after `execute` returned, whatever the outcome.
  fn wrap_up(&self);

  /// Releases resources of a previous run. Must be idempotent.
  fn destroy(&self);

  /// Whether the pipeline has fully unwound after a stop request.
  fn is_stopped(&self) -> bool;

  /// The message recorded when the pipeline halted itself, if any.
  fn stop_message(&self) -> Option<String>;

  fn has_stop_message(&self) -> bool {
    self.stop_message().is_some()
  }

  /// Signals the pipeline to stop at its next safe point.
  ///
  /// Must not block: it only records intent. The pipeline's own execution
  /// loop observes the request and returns from `execute`.
  fn request_stop(&self);

  /// Updates path-derived variables (flow directory, file name) from the
  /// file the pipeline was loaded from. Returns whether anything changed.
  fn set_source_path(&self, _path: &Path) -> bool {
    false
  }

  /// Number of errors the pipeline logged internally during the last run,
  /// if it keeps such a log.
  fn logged_error_count(&self) -> Option<usize> {
    None
  }

  fn as_pausable(&self) -> Option<&dyn Pausable> {
    None
  }

  fn as_breakpoint_host(&self) -> Option<&dyn BreakpointHost> {
    None
  }
}

/// Capability: the pipeline can suspend and continue its execution loop.
///
/// Both calls only flip a flag; the pipeline suspends at its next safe point.
pub trait Pausable: Send + Sync {
  fn pause(&self);
  fn resume(&self);
  fn is_paused(&self) -> bool;
}

/// Capability: the pipeline accepts breakpoint policies that pause it at
/// defined execution points.
pub trait BreakpointHost: Send + Sync {
  fn add_breakpoint(&self, breakpoint: Box<dyn Breakpoint>);

  /// Whether at least one unit of work would run, i.e. whether a breakpoint
  /// could ever fire.
  fn has_active_units(&self) -> bool;
}
