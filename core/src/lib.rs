// flowexec/src/lib.rs

//! flowexec: run a flow pipeline on its own thread and steer it from others.
//!
//! flowexec provides:
//!  - `ExecutionSession`, which runs one `Pipeline` on a dedicated execution
//!    thread and accepts pause, resume, cooperative stop and forced kill
//!    requests concurrently from any thread.
//!  - A single, deterministic terminal `ExecutionOutcome` per session
//!    (`Success`, `Error`, `UserStopped`, `Killed`), reported exactly once.
//!  - Ordered status, notification and completion callbacks through a
//!    `SessionListener`.
//!  - Capability-based pipelines: pause/resume (`Pausable`) and breakpoint
//!    policies (`BreakpointHost`) are opt-in.
//!  - Debug mode, which pauses before the first step of a run.
//!  - `Flow`, a ready-made pipeline of named steps operating on shared
//!    `ContextData`.

pub mod breakpoint;
pub mod core;
pub mod error;
pub mod flow;
pub mod pipeline;
pub mod session;

// --- Re-exports for the Public API ---

pub use crate::core::context_data::ContextData;
pub use crate::core::control::FlowControl;
pub use crate::core::step::{StepDef, StepInfo};

pub use crate::pipeline::{BreakpointHost, Pausable, Pipeline};

pub use crate::breakpoint::{
  Breakpoint, ExecutionPoint, PauseBeforeEveryStep, PauseBeforeFirstStep, StepBreakpoint,
};

pub use crate::flow::{Flow, Handler, StepScope, FLOW_DIR_VARIABLE, FLOW_FILENAME_VARIABLE};

pub use crate::session::{
  ExecutionOutcome, ExecutionSession, NullListener, SessionConfig, SessionListener, SessionState, Severity,
};

pub use crate::error::{FlowExecError, FlowExecResult};

/*
    Core Workflow:
    1. Bring a pipeline: implement `Pipeline` (optionally `Pausable`,
       `BreakpointHost`), or build a `Flow<MyData>` and register step handlers
       with `.on("step", |scope| ...)`.
    2. Implement `SessionListener` to receive status text, the optional
       notification and the final outcome (or use `NullListener` and poll).
    3. Create an `ExecutionSession` with the pipeline, the listener and a
       `SessionConfig` (debug mode, notification, stop timeout ...).
    4. Call `start()`. From any thread, call `pause()`, `resume()`, `stop()`
       or, as a last resort, `kill()`.
    5. `wait()` for the outcome, or react to `SessionListener::finished`.
*/
