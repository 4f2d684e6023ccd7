// src/step.rs

//! Steps: the unit of work that produces exactly one [`StepResult`].

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::{
    BoxFuture, EngineHandle, ExecutionEngine, RunnableUnit, UnitSpec, with_exit_code,
    with_stderr, with_stdout,
};
use crate::types::StepStatus;

/// Immutable outcome of one executed or skipped step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Human label of the step.
    pub title: String,
    /// Kind name reported in the JSON record (`failed_steps` etc.).
    pub kind: String,
    pub status: StepStatus,
    pub created_at: DateTime<Utc>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

impl StepResult {
    pub fn new(
        title: impl Into<String>,
        kind: impl Into<String>,
        status: StepStatus,
        stdout: Option<String>,
        stderr: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            kind: kind.into(),
            status,
            created_at: Utc::now(),
            stdout,
            stderr,
        }
    }
}

impl std::fmt::Display for StepResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.status)
    }
}

/// A schedulable unit of work.
///
/// Implementors provide `run`; `skip`, `grouping` and `collect_result` are
/// shared behaviour.
pub trait Step: Send + Sync {
    fn title(&self) -> &str;

    /// Kind name used in the JSON record; defaults to the title in
    /// UpperCamelCase.
    fn kind(&self) -> String {
        kind_from_title(self.title())
    }

    fn run(&self) -> BoxFuture<'_, Result<StepResult>>;

    /// A `Skipped` result carrying `reason` as stdout; nothing is executed.
    fn skip(&self, reason: Option<String>) -> StepResult {
        StepResult::new(self.title(), self.kind(), StepStatus::Skipped, reason, None)
    }

    /// Engine sub-scope named after this step, used to group its units.
    fn grouping(&self, engine: &dyn ExecutionEngine) -> EngineHandle {
        engine.pipeline(self.title())
    }

    /// Concurrently observe exit code, stdout and stderr of `unit` and turn
    /// them into a result once all three are known.
    fn collect_result<'a>(&'a self, unit: &'a dyn RunnableUnit) -> BoxFuture<'a, Result<StepResult>> {
        Box::pin(async move {
            let (exit_code, stdout, stderr) =
                tokio::join!(with_exit_code(unit), with_stdout(unit), with_stderr(unit));

            let exit_code = exit_code?;
            let status = StepStatus::from_exit_code(exit_code)?;
            debug!(step = %self.title(), exit_code, %status, "collected step observations");

            Ok(StepResult::new(
                self.title(),
                self.kind(),
                status,
                Some(stdout),
                Some(stderr),
            ))
        })
    }
}

/// `"unit tests"` -> `"UnitTests"`.
pub fn kind_from_title(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// A step that runs one shell command in a unit built by the engine.
#[derive(Debug, Clone)]
pub struct CommandStep {
    title: String,
    kind: String,
    spec: UnitSpec,
    skip_reason: Option<String>,
    engine: EngineHandle,
}

impl CommandStep {
    pub fn new(title: impl Into<String>, spec: UnitSpec, engine: EngineHandle) -> Self {
        let title = title.into();
        Self {
            kind: kind_from_title(&title),
            title,
            spec,
            skip_reason: None,
            engine,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Always produce a skipped result with this reason.
    pub fn skipped(mut self, reason: impl Into<String>) -> Self {
        self.skip_reason = Some(reason.into());
        self
    }
}

impl Step for CommandStep {
    fn title(&self) -> &str {
        &self.title
    }

    fn kind(&self) -> String {
        self.kind.clone()
    }

    fn run(&self) -> BoxFuture<'_, Result<StepResult>> {
        Box::pin(async move {
            if let Some(reason) = &self.skip_reason {
                info!(step = %self.title, %reason, "skipping step");
                return Ok(self.skip(Some(reason.clone())));
            }

            let scope = self.grouping(self.engine.as_ref());
            info!(step = %self.title, scope = %scope.label(), cmd = %self.spec.cmd, "running step");
            let unit = scope.unit(self.spec.clone());
            let result = self.collect_result(unit.as_ref()).await?;
            info!(step = %self.title, status = %result.status, "step finished");
            Ok(result)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ProcessEngine;

    #[test]
    fn kind_is_camel_cased_title() {
        assert_eq!(kind_from_title("unit tests"), "UnitTests");
        assert_eq!(kind_from_title("Actions Runner Pipeline"), "ActionsRunnerPipeline");
        assert_eq!(kind_from_title("lint-python_code"), "LintPythonCode");
    }

    #[test]
    fn skip_carries_reason_as_stdout() {
        let step = CommandStep::new("Lint", UnitSpec::new("ruff ."), ProcessEngine::handle("ci"));
        let result = step.skip(Some("nothing changed".into()));
        assert_eq!(result.status, StepStatus::Skipped);
        assert_eq!(result.stdout.as_deref(), Some("nothing changed"));
        assert_eq!(result.stderr, None);
        assert_eq!(result.kind, "Lint");
        assert_eq!(result.to_string(), "Lint: Skipped");
    }

    #[tokio::test]
    async fn configured_skip_does_not_execute() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = UnitSpec::new("touch ran.txt");
        spec.workdir = dir.path().to_path_buf();
        let step = CommandStep::new("Build", spec, ProcessEngine::handle("ci")).skipped("disabled");

        let result = step.run().await.unwrap();
        assert_eq!(result.status, StepStatus::Skipped);
        assert!(!dir.path().join("ran.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_step_maps_exit_codes() {
        let engine = ProcessEngine::handle("ci");
        let ok = CommandStep::new("ok", UnitSpec::new("echo fine"), engine.clone());
        let failed = CommandStep::new("failed", UnitSpec::new("echo bad >&2; exit 1"), engine.clone());
        let empty = CommandStep::new("empty", UnitSpec::new("exit 5"), engine.clone());
        let weird = CommandStep::new("weird", UnitSpec::new("exit 2"), engine);

        let r = ok.run().await.unwrap();
        assert_eq!(r.status, StepStatus::Success);
        assert_eq!(r.stdout.as_deref(), Some("fine\n"));

        let r = failed.run().await.unwrap();
        assert_eq!(r.status, StepStatus::Failure);
        assert_eq!(r.stderr.as_deref(), Some("bad\n"));

        assert_eq!(empty.run().await.unwrap().status, StepStatus::Skipped);
        assert!(weird.run().await.is_err());
    }
}
