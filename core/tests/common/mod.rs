// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use flowexec::{
  Breakpoint, BreakpointHost, ExecutionOutcome, ExecutionSession, FlowControl, Pausable, Pipeline, SessionConfig,
  SessionListener, Severity, StepScope,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::Level;

// --- Common Test Context for Flows ---
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
}

// --- Helper Handlers ---
pub fn create_simple_handler(
  step_name: &'static str,
  message_to_add: &'static str,
) -> impl Fn(StepScope<TestContext>) -> anyhow::Result<FlowControl> + Send + Sync + 'static {
  move |scope: StepScope<TestContext>| {
    let mut guard = scope.data().write();
    guard.counter += 1;
    guard.message.push_str(message_to_add);
    guard.steps_executed.push(step_name.to_string());
    Ok(FlowControl::Continue)
  }
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> impl Fn(StepScope<TestContext>) -> anyhow::Result<FlowControl> + Send + Sync + 'static {
  move |scope: StepScope<TestContext>| {
    scope.data().write().steps_executed.push(step_name.to_string());
    Err(anyhow::anyhow!(error_message))
  }
}

// --- Scripted Pipeline ---

/// Describes how a `ScriptedPipeline` behaves.
#[derive(Clone, Debug, Default)]
pub struct Script {
  pub setup_error: Option<&'static str>,
  /// How long `set_up` takes.
  pub setup_duration: Duration,
  pub execute_error: Option<&'static str>,
  /// How long `execute` takes when left alone.
  pub execute_duration: Duration,
  /// Return from `execute` as soon as a stop was requested.
  pub honors_stop: bool,
  /// Ignore everything and block in `execute` until `release()` is called.
  pub block_until_released: bool,
  pub stop_message: Option<&'static str>,
  /// After a stop request, `is_stopped` only turns true on this poll.
  pub stopped_after_polls: usize,
  pub pausable: bool,
  pub breakpoint_host: bool,
  pub panic_in_execute: bool,
}

/// A pipeline whose behavior is driven by a `Script`, counting every call.
#[derive(Default)]
pub struct ScriptedPipeline {
  script: Script,
  pub calls: Mutex<Vec<&'static str>>,
  pub execute_calls: AtomicUsize,
  pub wrap_up_calls: AtomicUsize,
  pub request_stop_calls: AtomicUsize,
  pub is_stopped_calls: AtomicUsize,
  pub pause_calls: AtomicUsize,
  pub resume_calls: AtomicUsize,
  pub breakpoints_added: AtomicUsize,
  stop_requested: AtomicBool,
  stop_polls: AtomicUsize,
  finished: AtomicBool,
  paused: AtomicBool,
  released: AtomicBool,
  breakpoints: Mutex<Vec<Box<dyn Breakpoint>>>,
  control_hook: Mutex<Option<ControlHook>>,
}

type ControlHook = Box<dyn Fn(&'static str) + Send + Sync>;

impl ScriptedPipeline {
  pub fn new(script: Script) -> Self {
    Self {
      script,
      ..Default::default()
    }
  }

  pub fn release(&self) {
    self.released.store(true, Ordering::SeqCst);
  }

  /// Runs `hook` with the call name from `request_stop`, `pause` and
  /// `resume`, on the calling thread.
  pub fn set_control_hook(&self, hook: impl Fn(&'static str) + Send + Sync + 'static) {
    *self.control_hook.lock() = Some(Box::new(hook));
  }

  pub fn clear_control_hook(&self) {
    self.control_hook.lock().take();
  }

  fn run_control_hook(&self, call: &'static str) {
    if let Some(hook) = self.control_hook.lock().as_ref() {
      hook(call);
    }
  }

  pub fn call_log(&self) -> Vec<&'static str> {
    self.calls.lock().clone()
  }

  fn record(&self, call: &'static str) {
    self.calls.lock().push(call);
  }
}

impl Pipeline for ScriptedPipeline {
  fn set_up(&self) -> anyhow::Result<()> {
    self.record("set_up");
    thread::sleep(self.script.setup_duration);
    match self.script.setup_error {
      Some(message) => Err(anyhow::anyhow!(message)),
      None => Ok(()),
    }
  }

  fn execute(&self) -> anyhow::Result<()> {
    self.record("execute");
    self.execute_calls.fetch_add(1, Ordering::SeqCst);
    if self.script.panic_in_execute {
      panic!("actor exploded");
    }

    let started = Instant::now();
    loop {
      if self.released.load(Ordering::SeqCst) {
        break;
      }
      if !self.script.block_until_released {
        if self.script.honors_stop && self.stop_requested.load(Ordering::SeqCst) {
          break;
        }
        if started.elapsed() >= self.script.execute_duration {
          break;
        }
      }
      thread::sleep(Duration::from_millis(2));
    }
    self.finished.store(true, Ordering::SeqCst);

    match self.script.execute_error {
      Some(message) => Err(anyhow::anyhow!(message)),
      None => Ok(()),
    }
  }

  fn wrap_up(&self) {
    self.record("wrap_up");
    self.wrap_up_calls.fetch_add(1, Ordering::SeqCst);
  }

  fn destroy(&self) {
    self.record("destroy");
  }

  fn is_stopped(&self) -> bool {
    self.is_stopped_calls.fetch_add(1, Ordering::SeqCst);
    if !self.stop_requested.load(Ordering::SeqCst) {
      return self.finished.load(Ordering::SeqCst);
    }
    let polls = self.stop_polls.fetch_add(1, Ordering::SeqCst) + 1;
    polls >= self.script.stopped_after_polls
  }

  fn stop_message(&self) -> Option<String> {
    self.script.stop_message.map(str::to_string)
  }

  fn request_stop(&self) {
    self.request_stop_calls.fetch_add(1, Ordering::SeqCst);
    self.stop_requested.store(true, Ordering::SeqCst);
    self.run_control_hook("request_stop");
  }

  fn as_pausable(&self) -> Option<&dyn Pausable> {
    if self.script.pausable {
      Some(self)
    } else {
      None
    }
  }

  fn as_breakpoint_host(&self) -> Option<&dyn BreakpointHost> {
    if self.script.breakpoint_host {
      Some(self)
    } else {
      None
    }
  }
}

impl Pausable for ScriptedPipeline {
  fn pause(&self) {
    self.pause_calls.fetch_add(1, Ordering::SeqCst);
    self.paused.store(true, Ordering::SeqCst);
    self.run_control_hook("pause");
  }

  fn resume(&self) {
    self.resume_calls.fetch_add(1, Ordering::SeqCst);
    self.paused.store(false, Ordering::SeqCst);
    self.run_control_hook("resume");
  }

  fn is_paused(&self) -> bool {
    self.paused.load(Ordering::SeqCst)
  }
}

impl BreakpointHost for ScriptedPipeline {
  fn add_breakpoint(&self, breakpoint: Box<dyn Breakpoint>) {
    self.breakpoints_added.fetch_add(1, Ordering::SeqCst);
    self.breakpoints.lock().push(breakpoint);
  }

  fn has_active_units(&self) -> bool {
    true
  }
}

// --- Recording Listener ---

type StatusHook = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
pub struct RecordingListener {
  pub statuses: Mutex<Vec<String>>,
  pub notifications: Mutex<Vec<(String, Severity)>>,
  pub outcomes: Mutex<Vec<ExecutionOutcome>>,
  pub clears: AtomicUsize,
  status_hook: Mutex<Option<StatusHook>>,
}

impl RecordingListener {
  pub fn new() -> Self {
    Self::default()
  }

  /// Runs `hook` on every status callback, from the delivering thread.
  pub fn set_status_hook(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
    *self.status_hook.lock() = Some(Box::new(hook));
  }

  pub fn statuses(&self) -> Vec<String> {
    self.statuses.lock().clone()
  }

  pub fn outcomes(&self) -> Vec<ExecutionOutcome> {
    self.outcomes.lock().clone()
  }

  pub fn notifications(&self) -> Vec<(String, Severity)> {
    self.notifications.lock().clone()
  }

  pub fn count_status(&self, text: &str) -> usize {
    self.statuses.lock().iter().filter(|s| s.as_str() == text).count()
  }
}

impl SessionListener for RecordingListener {
  fn status(&self, text: &str) {
    tracing::debug!(target: "test_listener", status = text);
    self.statuses.lock().push(text.to_string());
    if let Some(hook) = self.status_hook.lock().as_ref() {
      hook(text);
    }
  }

  fn clear_notification(&self) {
    self.clears.fetch_add(1, Ordering::SeqCst);
  }

  fn notify(&self, message: &str, severity: Severity) {
    self.notifications.lock().push((message.to_string(), severity));
  }

  fn finished(&self, outcome: &ExecutionOutcome) {
    self.outcomes.lock().push(outcome.clone());
  }
}

// --- Session Helpers ---

/// Creates a session over `pipeline` with a fresh `RecordingListener` and
/// starts it.
pub fn start_session(pipeline: Arc<dyn Pipeline>, config: SessionConfig) -> (ExecutionSession, Arc<RecordingListener>) {
  let listener = Arc::new(RecordingListener::new());
  let session = ExecutionSession::new(pipeline, listener.clone(), config);
  session.start().expect("session should start");
  (session, listener)
}

// --- Assertion Helpers ---

/// Asserts that `expected` appears in `actual` in order (not necessarily
/// contiguously).
pub fn assert_in_order(actual: &[String], expected: &[&str]) {
  let mut remaining = actual.iter();
  for wanted in expected {
    assert!(
      remaining.any(|s| s == wanted),
      "expected {:?} in order within {:?}",
      expected,
      actual
    );
  }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
  let deadline = Instant::now() + timeout;
  while Instant::now() < deadline {
    if condition() {
      return true;
    }
    thread::sleep(Duration::from_millis(2));
  }
  condition()
}

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
