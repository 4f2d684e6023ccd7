// src/sink/github.rs

//! Commit statuses through the GitHub CLI (`gh api`).

use anyhow::{Context, anyhow};
use tokio::process::Command;
use tracing::debug;

use super::{CommitStatus, StatusSink};
use crate::exec::BoxFuture;

/// Posts statuses to `repos/<repo>/statuses/<sha>` with `gh api`.
///
/// The access token is handed to `gh` through `GH_TOKEN`.
#[derive(Clone)]
pub struct GhCliStatusSink {
    token: Option<String>,
    program: String,
}

impl std::fmt::Debug for GhCliStatusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhCliStatusSink")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("program", &self.program)
            .finish()
    }
}

impl GhCliStatusSink {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            program: "gh".to_string(),
        }
    }

    /// Use a different `gh` executable (mainly for tests).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn api_args(status: &CommitStatus) -> Vec<String> {
        let mut args = vec![
            "api".to_string(),
            "--method".to_string(),
            "POST".to_string(),
            format!("repos/{}/statuses/{}", status.repo, status.sha),
            "-f".to_string(),
            format!("state={}", status.state),
            "-f".to_string(),
            format!("description={}", status.description),
            "-f".to_string(),
            format!("context={}", status.context),
        ];
        if let Some(url) = &status.target_url {
            args.push("-f".to_string());
            args.push(format!("target_url={url}"));
        }
        args
    }
}

impl StatusSink for GhCliStatusSink {
    fn send<'a>(&'a self, status: &'a CommitStatus) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let token = self
                .token
                .as_deref()
                .ok_or_else(|| anyhow!("CI_GITHUB_ACCESS_TOKEN is not set"))?;

            let args = Self::api_args(status);
            debug!(program = %self.program, ?args, "posting commit status");

            let output = Command::new(&self.program)
                .args(&args)
                .env("GH_TOKEN", token)
                .output()
                .await
                .with_context(|| format!("spawning '{}' to post commit status", self.program))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(anyhow!(
                    "'{} api' failed ({}): {}",
                    self.program,
                    output.status,
                    stderr.trim()
                ));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> CommitStatus {
        CommitStatus {
            sha: "abc123".into(),
            state: "failure".into(),
            target_url: Some("https://ci/run/9".into()),
            description: "Test failed.".into(),
            context: "CI for org/repo".into(),
            should_send: true,
            repo: "org/repo".into(),
        }
    }

    #[test]
    fn builds_status_api_call() {
        let args = GhCliStatusSink::api_args(&status());
        assert_eq!(args[3], "repos/org/repo/statuses/abc123");
        assert!(args.contains(&"state=failure".to_string()));
        assert!(args.contains(&"target_url=https://ci/run/9".to_string()));
    }

    #[tokio::test]
    async fn missing_token_is_an_error() {
        let sink = GhCliStatusSink::new(None);
        let err = sink.send(&status()).await.unwrap_err();
        assert!(err.to_string().contains("CI_GITHUB_ACCESS_TOKEN"));
    }

    #[test]
    fn debug_output_redacts_token() {
        let sink = GhCliStatusSink::new(Some("secret".into()));
        let rendered = format!("{sink:?}");
        assert!(!rendered.contains("secret"));
    }
}
