// flowexec/src/flow/scope.rs

//! Defines the `Handler<TData>` type for flow steps and the `StepScope<TData>`
//! a handler receives.

use crate::core::context_data::ContextData;
use crate::core::control::FlowControl;
use crate::core::step::StepInfo;
use crate::flow::signals::FlowSignals;
use std::sync::Arc;
use std::time::Duration;

/// Type alias for a flow step handler.
///
/// A handler runs synchronously on the session's execution thread. It
/// receives a [`StepScope`] and returns:
/// - `Ok(FlowControl::Continue)` to proceed with the next step,
/// - `Ok(FlowControl::Stop)` to end the flow early without error,
/// - `Ok(FlowControl::Halt(msg))` to end the flow with a stop message,
/// - `Err(e)` to fail the run.
///
/// Long-running handlers should poll [`StepScope::is_stop_requested`] or
/// wait through [`StepScope::sleep`] so a cooperative stop can reach them.
pub type Handler<TData> = Box<dyn Fn(StepScope<TData>) -> anyhow::Result<FlowControl> + Send + Sync>;

/// Everything a step handler can see of its flow.
pub struct StepScope<TData: Send + Sync + 'static> {
  data: ContextData<TData>,
  step: StepInfo,
  signals: Arc<FlowSignals>,
}

impl<TData: Send + Sync + 'static> StepScope<TData> {
  pub(crate) fn new(data: ContextData<TData>, step: StepInfo, signals: Arc<FlowSignals>) -> Self {
    Self { data, step, signals }
  }

  /// The flow's shared context data.
  pub fn data(&self) -> &ContextData<TData> {
    &self.data
  }

  pub fn step(&self) -> &StepInfo {
    &self.step
  }

  pub fn variable(&self, name: &str) -> Option<String> {
    self.signals.variables.read().get(name).cloned()
  }

  pub fn is_stop_requested(&self) -> bool {
    self.signals.is_stop_requested()
  }

  /// Sleeps for up to `duration`, returning early when the flow is asked to
  /// stop. Returns true if the full duration elapsed.
  pub fn sleep(&self, duration: Duration) -> bool {
    self.signals.sleep_unless_stopped(duration)
  }

  /// Records a non-fatal error. The count shows up in the session's final
  /// status line.
  pub fn log_error(&self, message: impl Into<String>) {
    let message = message.into();
    tracing::warn!(step = %self.step.name, error = %message, "Step logged an error.");
    self.signals.log_error(message);
  }
}
