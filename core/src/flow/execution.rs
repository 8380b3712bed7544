// flowexec/src/flow/execution.rs

//! Contains the `Pipeline` implementation of `Flow<TData>`: set-up, the step
//! loop with its stop, pause and breakpoint checks, and the tear-down hooks.

use crate::breakpoint::{Breakpoint, ExecutionPoint};
use crate::core::control::FlowControl;
use crate::core::step::StepInfo;
use crate::error::FlowExecError;
use crate::flow::definition::{Flow, FLOW_DIR_VARIABLE, FLOW_FILENAME_VARIABLE};
use crate::flow::scope::StepScope;
use crate::pipeline::{BreakpointHost, Pausable, Pipeline};
use std::collections::HashSet;
use std::path::Path;
use tracing::{event, instrument, span, Level};

impl<TData> Flow<TData>
where
  TData: 'static + Send + Sync,
{
  /// Evaluates the registered breakpoints at `point` and pauses if any fired.
  fn check_breakpoints(&self, point: ExecutionPoint, step: &StepInfo) {
    let fired = {
      let mut breakpoints = self.breakpoints.lock();
      let mut fired = Vec::new();
      let mut idx = 0;
      while idx < breakpoints.len() {
        if breakpoints[idx].triggers(point, step) {
          breakpoints[idx].triggered();
          fired.push(breakpoints[idx].describe());
          if breakpoints[idx].one_off() {
            breakpoints.remove(idx);
            continue;
          }
        }
        idx += 1;
      }
      fired
    };

    if !fired.is_empty() {
      event!(Level::INFO, %point, breakpoints = ?fired, "Breakpoint reached, pausing flow.");
      self.signals.pause();
    }
  }

  /// Runs one step: breakpoints, pause gate, handlers. Returns `Ok(false)`
  /// when the flow must not continue past this step.
  fn run_step(&self, step: &StepInfo) -> anyhow::Result<bool> {
    self.check_breakpoints(ExecutionPoint::PreExecute, step);
    self.signals.wait_while_paused();
    if self.signals.is_stop_requested() {
      event!(Level::DEBUG, "Stop requested while waiting before step.");
      return Ok(false);
    }

    if let Some(handlers) = self.handlers.get(&step.name) {
      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        let handler_span = span!(Level::DEBUG, "step_handler", handler_index = handler_idx);
        let _handler_span_guard = handler_span.enter();
        let scope = StepScope::new(self.data.clone(), step.clone(), self.signals.clone());
        match handler_fn(scope) {
          Ok(FlowControl::Continue) => {}
          Ok(FlowControl::Stop) => {
            event!(Level::INFO, "Flow stopped by a step handler.");
            return Ok(false);
          }
          Ok(FlowControl::Halt(message)) => {
            event!(Level::WARN, stop_message = %message, "Flow halted by a step handler.");
            self.signals.halt(message);
            return Ok(false);
          }
          Err(e) => {
            event!(Level::ERROR, error = %e, "Step handler failed.");
            return Err(e.context(format!("step '{}' failed", step.name)));
          }
        }
      }
    }

    self.check_breakpoints(ExecutionPoint::PostExecute, step);
    Ok(true)
  }
}

impl<TData> Pipeline for Flow<TData>
where
  TData: 'static + Send + Sync,
{
  #[instrument(name = "Flow::set_up", skip_all, fields(num_steps = self.steps.len()), err(Display))]
  fn set_up(&self) -> anyhow::Result<()> {
    self.signals.reset_run();

    let mut seen = HashSet::new();
    let mut active = Vec::new();
    for step_def in &self.steps {
      if !seen.insert(step_def.name.as_str()) {
        return Err(
          FlowExecError::DuplicateStep {
            step_name: step_def.name.clone(),
          }
          .into(),
        );
      }
      if !step_def.enabled {
        event!(Level::DEBUG, step = %step_def.name, "Dropping disabled step.");
        continue;
      }
      if self.handlers.get(&step_def.name).map_or(true, |v| v.is_empty()) {
        return Err(
          FlowExecError::HandlerMissing {
            step_name: step_def.name.clone(),
          }
          .into(),
        );
      }
      active.push(StepInfo {
        name: step_def.name.clone(),
        index: active.len(),
      });
    }

    event!(Level::DEBUG, active_steps = active.len(), "Flow set up.");
    *self.active.lock() = active;
    Ok(())
  }

  #[instrument(name = "Flow::execute", skip_all, err(Display))]
  fn execute(&self) -> anyhow::Result<()> {
    let active = self.active.lock().clone();
    event!(Level::DEBUG, active_steps = active.len(), "Flow execution starting.");

    let mut result = Ok(());
    for step in &active {
      if self.signals.is_stop_requested() {
        event!(Level::INFO, "Stop requested, skipping remaining steps.");
        break;
      }

      let step_span = span!(
        Level::INFO,
        "flow_step_execution",
        step_name = step.name.as_str(),
        step_index = step.index
      );
      let _step_span_guard = step_span.enter();

      match self.run_step(step) {
        Ok(true) => event!(Level::DEBUG, "Step finished."),
        Ok(false) => break,
        Err(e) => {
          result = Err(e);
          break;
        }
      }
    }

    self.signals.mark_stopped();
    result
  }

  fn wrap_up(&self) {
    // One-off breakpoints belong to the run they were attached for.
    self.breakpoints.lock().retain(|bp| !bp.one_off());
    self.signals.resume();
    event!(Level::DEBUG, logged_errors = self.signals.error_count(), "Flow wrapped up.");
  }

  fn destroy(&self) {
    self.active.lock().clear();
    self.signals.reset_run();
  }

  fn is_stopped(&self) -> bool {
    self.signals.is_stopped()
  }

  fn stop_message(&self) -> Option<String> {
    self.signals.stop_message()
  }

  fn request_stop(&self) {
    event!(Level::DEBUG, "Stop requested.");
    self.signals.request_stop();
  }

  fn set_source_path(&self, path: &Path) -> bool {
    let dir = path
      .parent()
      .map(|p| p.display().to_string())
      .unwrap_or_default();
    let file_name = path
      .file_name()
      .map(|f| f.to_string_lossy().into_owned())
      .unwrap_or_default();

    let mut variables = self.signals.variables.write();
    let changed_dir = variables.insert(FLOW_DIR_VARIABLE.to_string(), dir.clone()) != Some(dir);
    let changed_name = variables.insert(FLOW_FILENAME_VARIABLE.to_string(), file_name.clone()) != Some(file_name);
    changed_dir || changed_name
  }

  fn logged_error_count(&self) -> Option<usize> {
    Some(self.signals.error_count())
  }

  fn as_pausable(&self) -> Option<&dyn Pausable> {
    Some(self)
  }

  fn as_breakpoint_host(&self) -> Option<&dyn BreakpointHost> {
    Some(self)
  }
}

impl<TData> Pausable for Flow<TData>
where
  TData: 'static + Send + Sync,
{
  fn pause(&self) {
    self.signals.pause();
  }

  fn resume(&self) {
    self.signals.resume();
  }

  fn is_paused(&self) -> bool {
    self.signals.is_paused()
  }
}

impl<TData> BreakpointHost for Flow<TData>
where
  TData: 'static + Send + Sync,
{
  fn add_breakpoint(&self, breakpoint: Box<dyn Breakpoint>) {
    event!(Level::DEBUG, breakpoint = %breakpoint.describe(), "Breakpoint attached.");
    self.breakpoints.lock().push(breakpoint);
  }

  fn has_active_units(&self) -> bool {
    let active = self.active.lock();
    if !active.is_empty() {
      return true;
    }
    // Not set up yet: fall back to the definition.
    self.steps.iter().any(|s| s.enabled)
  }
}
