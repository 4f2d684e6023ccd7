// src/config/settings.rs

//! Settings resolved from the process environment.

use std::fmt;

use tracing::warn;

/// Environment-derived run settings.
///
/// Empty variables are treated as unset.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RunSettings {
    /// `CI` is unset.
    pub is_local: bool,
    /// `GIT_BRANCH` override for git discovery.
    pub git_branch: Option<String>,
    /// `GIT_REVISION` override for git discovery.
    pub git_revision: Option<String>,
    /// `GITHUB_REPOSITORY`.
    pub repo: Option<String>,
    /// `TEST_REPORTS_BUCKET_NAME`.
    pub bucket: Option<String>,
    /// `CI_GITHUB_ACCESS_TOKEN`.
    pub github_token: Option<String>,
    /// `GHA_WORKFLOW_RUN_URL`, or composed from the GitHub Actions variables.
    pub workflow_run_url: Option<String>,
    /// `PIPELINE_START_TIMESTAMP` (unix seconds).
    pub pipeline_start_timestamp: Option<i64>,
    /// `CI_CONTEXT`.
    pub ci_context: Option<String>,
}

impl fmt::Debug for RunSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunSettings")
            .field("is_local", &self.is_local)
            .field("git_branch", &self.git_branch)
            .field("git_revision", &self.git_revision)
            .field("repo", &self.repo)
            .field("bucket", &self.bucket)
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("workflow_run_url", &self.workflow_run_url)
            .field("pipeline_start_timestamp", &self.pipeline_start_timestamp)
            .field("ci_context", &self.ci_context)
            .finish()
    }
}

impl RunSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let workflow_run_url = get("GHA_WORKFLOW_RUN_URL").or_else(|| {
            match (get("GITHUB_SERVER_URL"), get("GITHUB_REPOSITORY"), get("GITHUB_RUN_ID")) {
                (Some(server), Some(repo), Some(run_id)) => {
                    Some(format!("{}/{repo}/actions/runs/{run_id}", server.trim_end_matches('/')))
                }
                _ => None,
            }
        });

        let pipeline_start_timestamp =
            get("PIPELINE_START_TIMESTAMP").and_then(|raw| match raw.trim().parse::<i64>() {
                Ok(ts) => Some(ts),
                Err(e) => {
                    warn!(value = %raw, error = %e, "ignoring invalid PIPELINE_START_TIMESTAMP");
                    None
                }
            });

        Self {
            is_local: lookup("CI").is_none(),
            git_branch: get("GIT_BRANCH"),
            git_revision: get("GIT_REVISION"),
            repo: get("GITHUB_REPOSITORY"),
            bucket: get("TEST_REPORTS_BUCKET_NAME"),
            github_token: get("CI_GITHUB_ACCESS_TOKEN"),
            workflow_run_url,
            pipeline_start_timestamp,
            ci_context: get("CI_CONTEXT"),
        }
    }
}
