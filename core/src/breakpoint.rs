// flowexec/src/breakpoint.rs

//! Breakpoint policies: strategy objects registered with a
//! [`BreakpointHost`](crate::pipeline::BreakpointHost) that decide whether the
//! pipeline pauses at a given execution point.
//!
//! Debug mode in [`ExecutionSession`](crate::ExecutionSession) attaches a
//! [`PauseBeforeFirstStep`]. Any other predicate over the execution point and
//! the current step can be expressed by implementing [`Breakpoint`].

use crate::core::step::StepInfo;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Where in a step's life cycle a breakpoint is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPoint {
  /// Right before the step's handlers run.
  PreExecute,
  /// Right after the step's handlers returned successfully.
  PostExecute,
}

impl fmt::Display for ExecutionPoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExecutionPoint::PreExecute => f.write_str("pre-execute"),
      ExecutionPoint::PostExecute => f.write_str("post-execute"),
    }
  }
}

/// A pause policy.
///
/// When [`triggers`](Breakpoint::triggers) returns true the host pauses itself
/// and waits for a resume (or a stop) before continuing.
pub trait Breakpoint: Send + Sync {
  fn triggers(&self, point: ExecutionPoint, step: &StepInfo) -> bool;

  /// One-off breakpoints are removed by the host after their first trigger.
  fn one_off(&self) -> bool {
    false
  }

  /// Called by the host each time the breakpoint fired.
  fn triggered(&self) {}

  /// Short description used in log output.
  fn describe(&self) -> String;
}

// Lets callers keep a handle on a registered breakpoint (e.g. to read its
// trigger count) while the host owns a boxed clone.
impl<B: Breakpoint + ?Sized> Breakpoint for Arc<B> {
  fn triggers(&self, point: ExecutionPoint, step: &StepInfo) -> bool {
    (**self).triggers(point, step)
  }

  fn one_off(&self) -> bool {
    (**self).one_off()
  }

  fn triggered(&self) {
    (**self).triggered()
  }

  fn describe(&self) -> String {
    (**self).describe()
  }
}

/// Pauses before the first unit of work of a run. One-off.
#[derive(Debug, Default)]
pub struct PauseBeforeFirstStep {
  trigger_count: AtomicUsize,
}

impl PauseBeforeFirstStep {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn trigger_count(&self) -> usize {
    self.trigger_count.load(Ordering::SeqCst)
  }
}

impl Breakpoint for PauseBeforeFirstStep {
  fn triggers(&self, point: ExecutionPoint, step: &StepInfo) -> bool {
    point == ExecutionPoint::PreExecute && step.is_first()
  }

  fn one_off(&self) -> bool {
    true
  }

  fn triggered(&self) {
    self.trigger_count.fetch_add(1, Ordering::SeqCst);
  }

  fn describe(&self) -> String {
    "pause before first step".to_string()
  }
}

/// Pauses before every step. Useful for single-stepping a flow.
#[derive(Debug, Default)]
pub struct PauseBeforeEveryStep {
  trigger_count: AtomicUsize,
}

impl PauseBeforeEveryStep {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn trigger_count(&self) -> usize {
    self.trigger_count.load(Ordering::SeqCst)
  }
}

impl Breakpoint for PauseBeforeEveryStep {
  fn triggers(&self, point: ExecutionPoint, _step: &StepInfo) -> bool {
    point == ExecutionPoint::PreExecute
  }

  fn triggered(&self) {
    self.trigger_count.fetch_add(1, Ordering::SeqCst);
  }

  fn describe(&self) -> String {
    "pause before every step".to_string()
  }
}

/// Pauses at a given execution point of the step with a given name.
#[derive(Debug)]
pub struct StepBreakpoint {
  step_name: String,
  point: ExecutionPoint,
  one_off: bool,
  trigger_count: AtomicUsize,
}

impl StepBreakpoint {
  /// Pauses right before the named step runs.
  pub fn before(step_name: impl Into<String>) -> Self {
    Self::at(step_name, ExecutionPoint::PreExecute)
  }

  /// Pauses right after the named step ran.
  pub fn after(step_name: impl Into<String>) -> Self {
    Self::at(step_name, ExecutionPoint::PostExecute)
  }

  pub fn at(step_name: impl Into<String>, point: ExecutionPoint) -> Self {
    Self {
      step_name: step_name.into(),
      point,
      one_off: false,
      trigger_count: AtomicUsize::new(0),
    }
  }

  /// Makes the breakpoint fire at most once.
  pub fn once(mut self) -> Self {
    self.one_off = true;
    self
  }

  pub fn trigger_count(&self) -> usize {
    self.trigger_count.load(Ordering::SeqCst)
  }
}

impl Breakpoint for StepBreakpoint {
  fn triggers(&self, point: ExecutionPoint, step: &StepInfo) -> bool {
    point == self.point && step.name == self.step_name
  }

  fn one_off(&self) -> bool {
    self.one_off
  }

  fn triggered(&self) {
    self.trigger_count.fetch_add(1, Ordering::SeqCst);
  }

  fn describe(&self) -> String {
    format!("{} of step '{}'", self.point, self.step_name)
  }
}
