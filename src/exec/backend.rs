// src/exec/backend.rs

//! Pluggable execution engine abstraction.
//!
//! Steps never talk to processes or containers directly. They ask an
//! [`ExecutionEngine`] handle for a [`RunnableUnit`] and observe its exit
//! code, stdout and stderr.
//!
//! - `ProcessEngine` is the default implementation used by the binary. It
//!   runs units through `tokio::process`, optionally inside `docker run`.
//! - Tests provide their own engine that returns scripted units.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use super::task_runner::ProcessUnit;

/// Boxed future returned by engine and unit methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shared handle to an execution engine scope.
pub type EngineHandle = Arc<dyn ExecutionEngine>;

/// Errors surfaced by the execution engine at the unit boundary.
///
/// Codes are structured where the engine knows them; the observation
/// adapter in [`super::observe`] still understands engines that only put
/// the information in the message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The unit ran and terminated unsuccessfully.
    #[error("{message}")]
    Exec {
        message: String,
        exit_code: Option<i32>,
    },

    /// A path requested from inside the unit does not exist.
    #[error("{message}")]
    NotFound { path: String, message: String },

    /// Any other engine failure (spawn errors, lost connection, timeouts...).
    #[error("{0}")]
    Query(String),
}

/// Everything needed to build one runnable unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitSpec {
    /// Shell command executed by the unit.
    pub cmd: String,
    /// Container image; when `None` the command runs on the host.
    pub image: Option<String>,
    /// Host directory used as working directory (mounted when containerised).
    pub workdir: PathBuf,
    /// Extra environment variables.
    pub env: BTreeMap<String, String>,
    /// Upper bound on the unit's runtime, enforced by the engine.
    pub timeout: Option<Duration>,
}

impl UnitSpec {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            workdir: PathBuf::from("."),
            ..Self::default()
        }
    }
}

/// An opaque, already-configured executable unit.
///
/// `exit_code` resolves to `Ok(0)` on success. Engines may report a
/// non-zero termination either as `Ok(code)` or as an
/// [`EngineError::Exec`].
pub trait RunnableUnit: Send + Sync {
    fn exit_code(&self) -> BoxFuture<'_, Result<i32, EngineError>>;

    fn stdout(&self) -> BoxFuture<'_, Result<String, EngineError>>;

    fn stderr(&self) -> BoxFuture<'_, Result<String, EngineError>>;

    /// Read a file relative to the unit's working directory.
    fn file_contents<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, EngineError>>;
}

/// Trait abstracting the engine that builds and runs units.
pub trait ExecutionEngine: Send + Sync + fmt::Debug {
    /// Grouping label of this scope, e.g. `"CI for org/repo / Lint"`.
    fn label(&self) -> &str;

    /// Create a named sub-scope. Never mutates `self`.
    fn pipeline(&self, name: &str) -> EngineHandle;

    /// Build a runnable unit for `spec` inside this scope.
    fn unit(&self, spec: UnitSpec) -> Arc<dyn RunnableUnit>;
}

/// Real engine backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    label: String,
}

impl ProcessEngine {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn handle(label: impl Into<String>) -> EngineHandle {
        Arc::new(Self::new(label))
    }
}

impl ExecutionEngine for ProcessEngine {
    fn label(&self) -> &str {
        &self.label
    }

    fn pipeline(&self, name: &str) -> EngineHandle {
        let label = if self.label.is_empty() {
            name.to_string()
        } else {
            format!("{} / {}", self.label, name)
        };
        debug!(parent = %self.label, scope = %label, "opening engine sub-scope");
        Arc::new(ProcessEngine { label })
    }

    fn unit(&self, spec: UnitSpec) -> Arc<dyn RunnableUnit> {
        Arc::new(ProcessUnit::new(self.label.clone(), spec))
    }
}
