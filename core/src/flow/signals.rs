// flowexec/src/flow/signals.rs

//! Run flags shared between a flow's execution loop, its step handlers and
//! the control calls arriving from other threads.

use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub(crate) struct FlowSignals {
  stop_requested: AtomicBool,
  stopped: AtomicBool,
  stop_message: Mutex<Option<String>>,
  // Guards the paused flag; the condvar wakes waiters on resume and on stop.
  paused: Mutex<bool>,
  wake: Condvar,
  errors: Mutex<Vec<String>>,
  pub(crate) variables: RwLock<HashMap<String, String>>,
}

impl FlowSignals {
  /// Clears everything a run leaves behind. Variables survive: they are
  /// owned by the flow definition, not by the run.
  pub(crate) fn reset_run(&self) {
    self.stop_requested.store(false, Ordering::SeqCst);
    self.stopped.store(false, Ordering::SeqCst);
    *self.stop_message.lock() = None;
    *self.paused.lock() = false;
    self.errors.lock().clear();
  }

  pub(crate) fn request_stop(&self) {
    self.stop_requested.store(true, Ordering::SeqCst);
    // Take the lock so a waiter cannot miss the notification between its
    // flag check and its wait.
    let _guard = self.paused.lock();
    self.wake.notify_all();
  }

  pub(crate) fn is_stop_requested(&self) -> bool {
    self.stop_requested.load(Ordering::SeqCst)
  }

  pub(crate) fn mark_stopped(&self) {
    self.stopped.store(true, Ordering::SeqCst);
  }

  pub(crate) fn is_stopped(&self) -> bool {
    self.stopped.load(Ordering::SeqCst)
  }

  /// Records a self-halt. The first message wins.
  pub(crate) fn halt(&self, message: String) {
    let mut slot = self.stop_message.lock();
    if slot.is_none() {
      *slot = Some(message);
    }
    drop(slot);
    self.request_stop();
  }

  pub(crate) fn stop_message(&self) -> Option<String> {
    self.stop_message.lock().clone()
  }

  pub(crate) fn pause(&self) {
    *self.paused.lock() = true;
  }

  pub(crate) fn resume(&self) {
    let mut paused = self.paused.lock();
    *paused = false;
    self.wake.notify_all();
  }

  pub(crate) fn is_paused(&self) -> bool {
    *self.paused.lock()
  }

  /// Blocks while paused. Returns early when a stop is requested.
  pub(crate) fn wait_while_paused(&self) {
    let mut paused = self.paused.lock();
    while *paused && !self.is_stop_requested() {
      self.wake.wait(&mut paused);
    }
  }

  /// Sleeps for up to `duration`, waking early on a stop request.
  /// Returns true if the full duration elapsed without a stop request.
  pub(crate) fn sleep_unless_stopped(&self, duration: Duration) -> bool {
    let mut paused = self.paused.lock();
    if self.is_stop_requested() {
      return false;
    }
    let result = self
      .wake
      .wait_while_for(&mut paused, |_| !self.is_stop_requested(), duration);
    result.timed_out() && !self.is_stop_requested()
  }

  pub(crate) fn log_error(&self, message: String) {
    self.errors.lock().push(message);
  }

  pub(crate) fn error_count(&self) -> usize {
    self.errors.lock().len()
  }

  pub(crate) fn errors(&self) -> Vec<String> {
    self.errors.lock().clone()
  }
}
