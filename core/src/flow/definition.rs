// flowexec/src/flow/definition.rs

//! Contains the `Flow<TData>` struct definition and methods for its
//! construction and structural modification.

use crate::breakpoint::Breakpoint;
use crate::core::context_data::ContextData;
use crate::core::control::FlowControl;
use crate::core::step::{StepDef, StepInfo};
use crate::error::{FlowExecError, FlowExecResult};
use crate::flow::scope::{Handler, StepScope};
use crate::flow::signals::FlowSignals;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, Level};

/// Name of the variable holding the directory of the flow's source file.
pub const FLOW_DIR_VARIABLE: &str = "flow_dir";
/// Name of the variable holding the file name of the flow's source file.
pub const FLOW_FILENAME_VARIABLE: &str = "flow_filename";

/// A flow: an ordered list of named steps (actors) operating on shared
/// context data `TData`.
///
/// `Flow` implements [`Pipeline`](crate::Pipeline) together with the
/// [`Pausable`](crate::Pausable) and [`BreakpointHost`](crate::BreakpointHost)
/// capabilities, so it can be handed to an
/// [`ExecutionSession`](crate::ExecutionSession) as is. The structure is built
/// with `&mut self` methods before the flow is shared; everything a run
/// touches lives behind locks or atomics.
pub struct Flow<TData>
where
  TData: 'static + Send + Sync,
{
  /// Ordered list of step definitions, enabled or not.
  pub(crate) steps: Vec<StepDef>,
  pub(crate) handlers: HashMap<String, Vec<Handler<TData>>>,
  pub(crate) data: ContextData<TData>,

  /// Enabled steps of the current run, computed by `set_up`.
  pub(crate) active: Mutex<Vec<StepInfo>>,
  pub(crate) breakpoints: Mutex<Vec<Box<dyn Breakpoint>>>,
  pub(crate) signals: Arc<FlowSignals>,
}

impl<TData> Flow<TData>
where
  TData: 'static + Send + Sync,
{
  /// Creates a new `Flow` over `data` with an initial set of `(name, enabled)`
  /// step definitions.
  pub fn new(data: ContextData<TData>, step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, enabled)| StepDef::new(*name, *enabled))
      .collect();

    Self {
      steps,
      handlers: HashMap::new(),
      data,
      active: Mutex::new(Vec::new()),
      breakpoints: Mutex::new(Vec::new()),
      signals: Arc::new(FlowSignals::default()),
    }
  }

  fn position(&self, step_name: &str) -> FlowExecResult<usize> {
    self
      .steps
      .iter()
      .position(|s| s.name == step_name)
      .ok_or_else(|| FlowExecError::StepNotFound {
        step_name: step_name.to_string(),
      })
  }

  fn ensure_step_not_exists(&self, step_name: &str) -> FlowExecResult<()> {
    if self.steps.iter().any(|s| s.name == step_name) {
      return Err(FlowExecError::DuplicateStep {
        step_name: step_name.to_string(),
      });
    }
    Ok(())
  }

  // --- Basic Step Manipulation Methods ---

  pub fn insert_before_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    enabled: bool,
  ) -> FlowExecResult<()> {
    let idx = self.position(existing_step_name)?;
    let name: String = new_step_name.into();
    self.ensure_step_not_exists(&name)?;
    self.steps.insert(idx, StepDef::new(name, enabled));
    Ok(())
  }

  pub fn insert_after_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    enabled: bool,
  ) -> FlowExecResult<()> {
    let idx = self.position(existing_step_name)?;
    let name: String = new_step_name.into();
    self.ensure_step_not_exists(&name)?;
    self.steps.insert(idx + 1, StepDef::new(name, enabled));
    Ok(())
  }

  /// Removes a step and its handlers. Removing an unknown step is a no-op.
  pub fn remove_step(&mut self, step_name: &str) {
    if let Ok(idx) = self.position(step_name) {
      self.steps.remove(idx);
      self.handlers.remove(step_name);
    }
  }

  pub fn set_enabled(&mut self, step_name: &str, enabled: bool) -> FlowExecResult<()> {
    let idx = self.position(step_name)?;
    self.steps[idx].enabled = enabled;
    Ok(())
  }

  /// Registers a handler for a step. Several handlers on one step run in
  /// registration order.
  pub fn on<F>(&mut self, step_name: &str, handler_fn: F) -> FlowExecResult<()>
  where
    F: Fn(StepScope<TData>) -> anyhow::Result<FlowControl> + Send + Sync + 'static,
  {
    self.position(step_name)?;
    event!(Level::TRACE, step = step_name, "Registering step handler.");
    self
      .handlers
      .entry(step_name.to_string())
      .or_default()
      .push(Box::new(handler_fn));
    Ok(())
  }

  pub fn steps(&self) -> &[StepDef] {
    &self.steps
  }

  /// The flow's shared context data.
  pub fn data(&self) -> &ContextData<TData> {
    &self.data
  }

  /// Sets a flow variable visible to handlers through [`StepScope::variable`].
  pub fn set_variable(&self, name: impl Into<String>, value: impl Into<String>) {
    self.signals.variables.write().insert(name.into(), value.into());
  }

  pub fn variable(&self, name: &str) -> Option<String> {
    self.signals.variables.read().get(name).cloned()
  }

  /// Errors logged by handlers during the last run.
  pub fn logged_errors(&self) -> Vec<String> {
    self.signals.errors()
  }

  pub fn breakpoint_count(&self) -> usize {
    self.breakpoints.lock().len()
  }
}
