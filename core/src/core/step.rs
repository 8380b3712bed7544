// flowexec/src/core/step.rs

//! Defines the structure for a single step (actor) within a flow.

/// Definition of a flow step: its name and whether it takes part in a run.
///
/// Disabled steps stay in the definition but are dropped from the active
/// step list when the flow is set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDef {
  pub name: String,
  pub enabled: bool,
}

impl StepDef {
  pub fn new(name: impl Into<String>, enabled: bool) -> Self {
    Self {
      name: name.into(),
      enabled,
    }
  }
}

/// Identity of an active step during a run, as seen by handlers and breakpoints.
///
/// `index` is the position within the active (enabled) steps, so the first
/// unit of work of a run always has index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInfo {
  pub name: String,
  pub index: usize,
}

impl StepInfo {
  pub fn is_first(&self) -> bool {
    self.index == 0
  }
}
