// flowexec/src/session/listener.rs

//! The owner-facing callback contract of an `ExecutionSession`.

use crate::session::outcome::{ExecutionOutcome, Severity};

/// Receives progress and the terminal outcome of a session.
///
/// Callbacks of one session are delivered one at a time, in the order the
/// session produced them, on whichever thread produced or flushed them (the
/// execution thread or a thread calling a control operation). They are never
/// invoked while the session holds its state lock, so a listener may call
/// back into the session.
///
/// Because delivery happens on the producing thread, a slow callback delays
/// the `pause`, `stop` or `kill` call that triggered it. Listeners that do
/// real work should hand it off to their own thread. Calling
/// [`ExecutionSession::wait`](crate::ExecutionSession::wait) from
/// [`finished`](Self::finished) returns the outcome being delivered.
pub trait SessionListener: Send + Sync {
  /// Best-effort progress text. May be called many times.
  fn status(&self, text: &str);

  /// A new run starts; drop any notification left from a previous one.
  fn clear_notification(&self) {}

  /// Called once at termination when the session was configured to notify.
  fn notify(&self, message: &str, severity: Severity);

  /// Called exactly once with the terminal outcome.
  fn finished(&self, outcome: &ExecutionOutcome);

  /// Severity used for the termination notification. Presentation is the
  /// owner's decision; the default follows [`Severity::for_outcome`].
  fn severity(&self, outcome: &ExecutionOutcome) -> Severity {
    Severity::for_outcome(outcome)
  }
}

/// A listener that ignores everything. For owners that only poll the session.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl SessionListener for NullListener {
  fn status(&self, _text: &str) {}

  fn notify(&self, _message: &str, _severity: Severity) {}

  fn finished(&self, _outcome: &ExecutionOutcome) {}
}
