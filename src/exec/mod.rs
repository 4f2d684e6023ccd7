// src/exec/mod.rs

//! Execution layer.
//!
//! This module is responsible for turning a step's configuration into a
//! running unit and observing how it terminated.
//!
//! - [`backend`] provides the `ExecutionEngine` / `RunnableUnit` traits,
//!   `EngineError`, and the concrete `ProcessEngine` used in production,
//!   which tests can replace with a fake implementation.
//! - [`task_runner`] runs a single unit process and captures its output.
//! - [`observe`] normalises engine failures into exit code / stdout /
//!   stderr values.

pub mod backend;
pub mod observe;
pub mod task_runner;

pub use backend::{
    BoxFuture, EngineError, EngineHandle, ExecutionEngine, ProcessEngine, RunnableUnit, UnitSpec,
};
pub use observe::{get_file_contents, with_exit_code, with_stderr, with_stdout};
pub use task_runner::ProcessUnit;
