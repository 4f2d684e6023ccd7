use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ci_orchestrator::exec::{
    BoxFuture, EngineError, EngineHandle, ExecutionEngine, RunnableUnit, UnitSpec,
};

/// What a fake unit reports for each observation.
#[derive(Debug, Clone)]
pub struct FakeOutcome {
    pub exit_code: Result<i32, EngineError>,
    pub stdout: Result<String, EngineError>,
    pub stderr: Result<String, EngineError>,
    pub files: HashMap<String, String>,
    /// Delay before the exit code is observed.
    pub delay: Option<Duration>,
}

impl FakeOutcome {
    /// Clean termination with `code` and empty streams.
    pub fn exit(code: i32) -> Self {
        Self {
            exit_code: Ok(code),
            stdout: Ok(String::new()),
            stderr: Ok(String::new()),
            files: HashMap::new(),
            delay: None,
        }
    }

    /// Engine reports the non-zero exit through an error message only, the
    /// way some container engines do.
    pub fn exec_error(code: i32) -> Self {
        Self {
            exit_code: Err(EngineError::Exec {
                message: format!("container exited with exit code: {code}"),
                exit_code: None,
            }),
            ..Self::exit(code)
        }
    }

    /// Exec failure carrying only `message`, with no structured exit code.
    pub fn exec_message(message: &str) -> Self {
        Self {
            exit_code: Err(EngineError::Exec {
                message: message.to_string(),
                exit_code: None,
            }),
            ..Self::exit(1)
        }
    }

    /// Infrastructure failure: no exit code can be determined.
    pub fn infra_error(message: &str) -> Self {
        Self {
            exit_code: Err(EngineError::Query(message.to_string())),
            ..Self::exit(0)
        }
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = Ok(stdout.to_string());
        self
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = Ok(stderr.to_string());
        self
    }

    pub fn with_stderr_error(mut self, err: EngineError) -> Self {
        self.stderr = Err(err);
        self
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// One unit the fake engine handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltUnit {
    /// Label of the engine scope the unit was built in.
    pub scope: String,
    pub cmd: String,
}

#[derive(Default)]
struct Shared {
    outcomes: Mutex<HashMap<String, FakeOutcome>>,
    built: Mutex<Vec<BuiltUnit>>,
}

/// A fake engine that:
/// - returns scripted outcomes keyed by the unit's command
/// - exits 0 for commands nobody scripted
/// - records every unit it builds, with its scope label.
///
/// Sub-scopes share the script and the record.
#[derive(Clone)]
pub struct FakeEngine {
    label: String,
    shared: Arc<Shared>,
}

impl fmt::Debug for FakeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeEngine").field("label", &self.label).finish()
    }
}

impl FakeEngine {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn script(self, cmd: &str, outcome: FakeOutcome) -> Self {
        self.shared
            .outcomes
            .lock()
            .unwrap()
            .insert(cmd.to_string(), outcome);
        self
    }

    pub fn handle(&self) -> EngineHandle {
        Arc::new(self.clone())
    }

    pub fn built_units(&self) -> Vec<BuiltUnit> {
        self.shared.built.lock().unwrap().clone()
    }
}

impl ExecutionEngine for FakeEngine {
    fn label(&self) -> &str {
        &self.label
    }

    fn pipeline(&self, name: &str) -> EngineHandle {
        Arc::new(FakeEngine {
            label: format!("{} / {}", self.label, name),
            shared: Arc::clone(&self.shared),
        })
    }

    fn unit(&self, spec: UnitSpec) -> Arc<dyn RunnableUnit> {
        let outcome = self
            .shared
            .outcomes
            .lock()
            .unwrap()
            .get(&spec.cmd)
            .cloned()
            .unwrap_or_else(|| FakeOutcome::exit(0));

        self.shared.built.lock().unwrap().push(BuiltUnit {
            scope: self.label.clone(),
            cmd: spec.cmd.clone(),
        });

        Arc::new(FakeUnit { outcome })
    }
}

/// Unit returned by [`FakeEngine`].
#[derive(Debug, Clone)]
pub struct FakeUnit {
    outcome: FakeOutcome,
}

impl FakeUnit {
    pub fn new(outcome: FakeOutcome) -> Self {
        Self { outcome }
    }
}

impl RunnableUnit for FakeUnit {
    fn exit_code(&self) -> BoxFuture<'_, Result<i32, EngineError>> {
        Box::pin(async move {
            if let Some(delay) = self.outcome.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome.exit_code.clone()
        })
    }

    fn stdout(&self) -> BoxFuture<'_, Result<String, EngineError>> {
        Box::pin(async move { self.outcome.stdout.clone() })
    }

    fn stderr(&self) -> BoxFuture<'_, Result<String, EngineError>> {
        Box::pin(async move { self.outcome.stderr.clone() })
    }

    fn file_contents<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, EngineError>> {
        Box::pin(async move {
            self.outcome
                .files
                .get(path)
                .cloned()
                .ok_or_else(|| EngineError::NotFound {
                    path: path.to_string(),
                    message: format!("{path}: no such file or directory"),
                })
        })
    }
}
