// flowexec/src/session/dispatch.rs

//! Ordered delivery of queued session events to the listener.
//!
//! Producers queue events while holding the session lock and call
//! [`Shared::flush`] after releasing it. Exactly one thread delivers at a
//! time; a producer that finds another thread delivering leaves its events to
//! that thread. A listener calling back into the session from a callback
//! therefore never deadlocks: its events are picked up by the outer loop.

use crate::session::{ExecutionOutcome, SessionEvent, Shared};
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{event, Level};

impl Shared {
  pub(crate) fn flush(&self) {
    loop {
      let Some(delivery_guard) = self.delivery.try_lock() else {
        return;
      };
      loop {
        let next = self.inner.lock().queue.pop_front();
        match next {
          Some(session_event) => self.deliver(session_event),
          None => break,
        }
      }
      drop(delivery_guard);

      // An event queued between the last pop and the release above was left
      // to us by a producer whose try_lock failed.
      if self.inner.lock().queue.is_empty() {
        return;
      }
    }
  }

  fn deliver(&self, session_event: SessionEvent) {
    let listener = &self.listener;
    if let SessionEvent::Finished(_) = &session_event {
      *self.finishing.lock() = Some(thread::current().id());
    }
    let delivered = panic::catch_unwind(AssertUnwindSafe(|| match &session_event {
      SessionEvent::Status(text) => listener.status(text),
      SessionEvent::ClearNotification => listener.clear_notification(),
      SessionEvent::Notify { message, outcome } => {
        let severity = listener.severity(outcome);
        listener.notify(message, severity);
      }
      SessionEvent::Finished(outcome) => listener.finished(outcome),
    }));
    if delivered.is_err() {
      event!(Level::ERROR, session_id = self.id, "Session listener panicked, event dropped.");
    }

    if let SessionEvent::Finished(outcome) = session_event {
      *self.finishing.lock() = None;
      *self.delivered.lock() = Some(outcome);
      self.delivered_cv.notify_all();
    }
  }

  /// The outcome being handed to `finished`, if that happens on this thread.
  fn outcome_in_delivery(&self) -> Option<ExecutionOutcome> {
    if *self.finishing.lock() != Some(thread::current().id()) {
      return None;
    }
    self.inner.lock().outcome.clone()
  }

  pub(crate) fn wait_delivered(&self) -> ExecutionOutcome {
    if let Some(outcome) = self.outcome_in_delivery() {
      return outcome;
    }
    let mut delivered = self.delivered.lock();
    loop {
      if let Some(outcome) = delivered.as_ref() {
        return outcome.clone();
      }
      self.delivered_cv.wait(&mut delivered);
    }
  }

  pub(crate) fn wait_delivered_for(&self, timeout: Duration) -> Option<ExecutionOutcome> {
    if let Some(outcome) = self.outcome_in_delivery() {
      return Some(outcome);
    }
    let deadline = Instant::now() + timeout;
    let mut delivered = self.delivered.lock();
    loop {
      if let Some(outcome) = delivered.as_ref() {
        return Some(outcome.clone());
      }
      if self.delivered_cv.wait_until(&mut delivered, deadline).timed_out() {
        return (*delivered).clone();
      }
    }
  }
}
