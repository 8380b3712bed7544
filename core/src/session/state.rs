// flowexec/src/session/state.rs

/// Lifecycle state of an `ExecutionSession`.
///
/// Transitions:
/// - `Idle -> Running` on `start`
/// - `Running <-> Paused` on `pause` / `resume`
/// - `Running | Paused -> Stopping` on `stop`
/// - any non-idle state `-> Terminal` once the outcome is decided
///
/// `Terminal` is final; the outcome itself is kept next to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
  Idle,
  Running,
  Paused,
  Stopping,
  Terminal,
}

impl SessionState {
  /// Running or paused: the flow is still under way and not being stopped.
  pub fn is_active(self) -> bool {
    matches!(self, SessionState::Running | SessionState::Paused)
  }

  pub fn is_terminal(self) -> bool {
    self == SessionState::Terminal
  }
}
