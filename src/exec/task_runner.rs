// src/exec/task_runner.rs

//! Process-backed runnable unit.

use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::backend::{BoxFuture, EngineError, RunnableUnit, UnitSpec};

/// Output captured from one finished process.
#[derive(Debug, Clone)]
struct CapturedOutput {
    code: i32,
    stdout: String,
    stderr: String,
}

/// A unit that runs its command at most once.
///
/// The first observation (`exit_code`, `stdout` or `stderr`) starts the
/// process; concurrent observers wait on the same `OnceCell` and share the
/// captured output. Only the initialising future writes the cell.
pub struct ProcessUnit {
    label: String,
    spec: UnitSpec,
    output: OnceCell<Result<CapturedOutput, EngineError>>,
}

impl ProcessUnit {
    pub fn new(label: String, spec: UnitSpec) -> Self {
        Self {
            label,
            spec,
            output: OnceCell::new(),
        }
    }

    async fn execution(&self) -> &Result<CapturedOutput, EngineError> {
        self.output
            .get_or_init(|| run_process(&self.label, &self.spec))
            .await
    }
}

impl RunnableUnit for ProcessUnit {
    fn exit_code(&self) -> BoxFuture<'_, Result<i32, EngineError>> {
        Box::pin(async move {
            match self.execution().await {
                Ok(out) if out.code == 0 => Ok(0),
                Ok(out) => Err(EngineError::Exec {
                    message: format!("process exited with exit code: {}", out.code),
                    exit_code: Some(out.code),
                }),
                Err(e) => Err(e.clone()),
            }
        })
    }

    fn stdout(&self) -> BoxFuture<'_, Result<String, EngineError>> {
        Box::pin(async move {
            match self.execution().await {
                Ok(out) => Ok(out.stdout.clone()),
                Err(e) => Err(e.clone()),
            }
        })
    }

    fn stderr(&self) -> BoxFuture<'_, Result<String, EngineError>> {
        Box::pin(async move {
            match self.execution().await {
                Ok(out) => Ok(out.stderr.clone()),
                Err(e) => Err(e.clone()),
            }
        })
    }

    fn file_contents<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, EngineError>> {
        Box::pin(async move {
            let full = self.spec.workdir.join(path);
            match tokio::fs::read_to_string(&full).await {
                Ok(contents) => Ok(contents),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EngineError::NotFound {
                    path: path.to_string(),
                    message: format!("{}: no such file or directory", full.display()),
                }),
                Err(e) => Err(EngineError::Query(format!(
                    "reading {}: {e}",
                    full.display()
                ))),
            }
        })
    }
}

/// Build the platform command for a spec.
///
/// With an image the command runs as
/// `docker run --rm -v <workdir>:/workspace -w /workspace [-e K=V].. <image> sh -c <cmd>`.
async fn build_command(spec: &UnitSpec) -> Command {
    if let Some(image) = &spec.image {
        let workdir = tokio::fs::canonicalize(&spec.workdir)
            .await
            .unwrap_or_else(|_| spec.workdir.clone());
        let mut c = Command::new("docker");
        c.arg("run")
            .arg("--rm")
            .arg("-v")
            .arg(format!("{}:/workspace", workdir.display()))
            .arg("-w")
            .arg("/workspace");
        for (key, value) in &spec.env {
            c.arg("-e").arg(format!("{key}={value}"));
        }
        c.arg(image).arg("sh").arg("-c").arg(&spec.cmd);
        return c;
    }

    let mut c = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&spec.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&spec.cmd);
        c
    };
    c.current_dir(&spec.workdir).envs(&spec.env);
    c
}

async fn run_process(label: &str, spec: &UnitSpec) -> Result<CapturedOutput, EngineError> {
    info!(scope = %label, cmd = %spec.cmd, image = ?spec.image, "starting unit process");

    let mut cmd = build_command(spec).await;
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| EngineError::Query(format!("spawning process for '{}': {e}", spec.cmd)))?;

    // Dropping the wait future on timeout drops the child, which kills it.
    let waited = match spec.timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(res) => res,
            Err(_) => {
                warn!(scope = %label, cmd = %spec.cmd, ?limit, "unit timed out; killing process");
                return Err(EngineError::Query(format!(
                    "unit '{}' timed out after {limit:?}",
                    spec.cmd
                )));
            }
        },
        None => child.wait_with_output().await,
    };

    let output = waited
        .map_err(|e| EngineError::Query(format!("waiting for process '{}': {e}", spec.cmd)))?;

    let Some(code) = output.status.code() else {
        return Err(EngineError::Query(format!(
            "process '{}' was terminated by a signal",
            spec.cmd
        )));
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    info!(
        scope = %label,
        exit_code = code,
        success = output.status.success(),
        "unit process exited"
    );
    debug!(scope = %label, stdout_len = stdout.len(), stderr_len = stderr.len(), "captured unit output");

    Ok(CapturedOutput {
        code,
        stdout,
        stderr,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;

    fn unit(cmd: &str) -> ProcessUnit {
        ProcessUnit::new("test".to_string(), UnitSpec::new(cmd))
    }

    #[tokio::test]
    async fn successful_process_reports_zero_and_streams() {
        let u = unit("echo out; echo err 1>&2");
        assert_eq!(u.exit_code().await, Ok(0));
        assert_eq!(u.stdout().await.unwrap(), "out\n");
        assert_eq!(u.stderr().await.unwrap(), "err\n");
    }

    #[tokio::test]
    async fn failing_process_reports_structured_exit_code() {
        let u = unit("echo boom 1>&2; exit 3");
        match u.exit_code().await {
            Err(EngineError::Exec { message, exit_code }) => {
                assert_eq!(exit_code, Some(3));
                assert!(message.contains("exit code: 3"));
            }
            other => panic!("expected Exec error, got {other:?}"),
        }
        // Streams are still available after a non-zero exit.
        assert_eq!(u.stderr().await.unwrap(), "boom\n");
    }

    #[tokio::test]
    async fn container_command_mounts_the_resolved_workdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let mut spec = UnitSpec::new("pytest");
        spec.image = Some("python:3.11".to_string());
        spec.workdir = dir.path().join("sub").join("..");

        let cmd = build_command(&spec).await;
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let canonical = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(cmd.as_std().get_program(), "docker");
        assert!(args.contains(&format!("{}:/workspace", canonical.display())));
        assert_eq!(&args[args.len() - 4..], ["python:3.11", "sh", "-c", "pytest"]);
    }

    #[tokio::test]
    async fn process_runs_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = UnitSpec::new("echo x >> runs.txt");
        spec.workdir = dir.path().to_path_buf();
        let u = ProcessUnit::new("test".to_string(), spec);

        let (a, b, c) = tokio::join!(u.exit_code(), u.stdout(), u.stderr());
        assert_eq!(a, Ok(0));
        assert!(b.is_ok() && c.is_ok());

        let runs = std::fs::read_to_string(dir.path().join("runs.txt")).unwrap();
        assert_eq!(runs.lines().count(), 1);
    }

    #[tokio::test]
    async fn timeout_is_an_engine_failure() {
        let mut spec = UnitSpec::new("sleep 5");
        spec.timeout = Some(Duration::from_millis(50));
        let u = ProcessUnit::new("test".to_string(), spec);

        match u.exit_code().await {
            Err(EngineError::Query(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected Query error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.txt"), "hello").unwrap();
        let mut spec = UnitSpec::new("true");
        spec.workdir = dir.path().to_path_buf();
        let u = ProcessUnit::new("test".to_string(), spec);

        assert_eq!(u.file_contents("present.txt").await.unwrap(), "hello");
        assert!(matches!(
            u.file_contents("absent.txt").await,
            Err(EngineError::NotFound { .. })
        ));
    }
}
