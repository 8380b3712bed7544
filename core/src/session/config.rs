// flowexec/src/session/config.rs

//! Defines `SessionConfig`, the per-run settings of an `ExecutionSession`.

use std::path::PathBuf;
use std::time::Duration;

/// Delay between two `is_stopped()` checks while a stop is being confirmed.
pub const DEFAULT_STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const DEFAULT_THREAD_NAME: &str = "flow-execution";

/// Settings fixed at session construction.
///
/// ```
/// use flowexec::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///   .with_debug(true)
///   .with_stop_timeout(Duration::from_secs(30));
/// assert!(config.debug);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
  /// Attach a pause-before-first-step breakpoint before executing.
  pub debug: bool,
  /// Report the outcome to the listener's notification channel as well.
  pub notify: bool,
  /// File the pipeline was loaded from; only used to update path-derived
  /// pipeline variables.
  pub source_path: Option<PathBuf>,
  pub stop_poll_interval: Duration,
  /// Upper bound, counted from the `stop()` request, on the time the pipeline
  /// gets to return from `execute()` and confirm the stop. Past it the session
  /// escalates to a kill. `None` waits forever.
  pub stop_timeout: Option<Duration>,
  pub thread_name: String,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      debug: false,
      notify: false,
      source_path: None,
      stop_poll_interval: DEFAULT_STOP_POLL_INTERVAL,
      stop_timeout: None,
      thread_name: DEFAULT_THREAD_NAME.to_string(),
    }
  }
}

impl SessionConfig {
  pub fn with_debug(mut self, debug: bool) -> Self {
    self.debug = debug;
    self
  }

  pub fn with_notify(mut self, notify: bool) -> Self {
    self.notify = notify;
    self
  }

  pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.source_path = Some(path.into());
    self
  }

  pub fn with_stop_poll_interval(mut self, interval: Duration) -> Self {
    self.stop_poll_interval = interval;
    self
  }

  pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
    self.stop_timeout = Some(timeout);
    self
  }

  pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
    self.thread_name = name.into();
    self
  }
}
