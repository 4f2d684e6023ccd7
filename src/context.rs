// src/context.rs

//! Run contexts and their scoped lifecycle.
//!
//! A [`Context`] holds the identity of one orchestration run (or one
//! pipeline inside it), its lifecycle state and, once everything has
//! joined, its [`Report`]. The global context is what reports to the
//! outside world:
//!
//! - `INITIALIZED` after construction; the entry point sends the first
//!   "pending" status with [`Context::notify_status`].
//! - `RUNNING` after [`Context::enter`].
//! - `SUCCESSFUL`/`FAILURE` when a report is attached, `ERROR` when the
//!   scope ends with an error or without a report.
//!
//! [`Context::exit`] always sends the final status, whatever the outcome.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::errors::{OrchestratorError, Result};
use crate::exec::{BoxFuture, EngineHandle};
use crate::report::{Report, local_report_path, remote_report_key};
use crate::sink::{CommitStatus, ReportStorage, StatusSink, UploadSink, update_commit_status_check};
use crate::types::{ContextState, ScopeKind, github_state, state_description};

const TEARDOWN_SCOPE: &str = "Teardown pipeline";

/// Identity shared by a global context and the pipeline contexts it derives.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextInfo {
    pub is_local: bool,
    pub git_branch: String,
    pub git_revision: String,
    /// `owner/name` (or URL) of the repository under test.
    pub git_repo_url: String,
    pub created_at: DateTime<Utc>,
    pub workflow_run_url: Option<String>,
    pub ci_context: Option<String>,
    /// Unix seconds at which the surrounding CI pipeline started.
    pub pipeline_start_timestamp: Option<i64>,
}

impl ContextInfo {
    pub fn new(
        is_local: bool,
        git_branch: impl Into<String>,
        git_revision: impl Into<String>,
        git_repo_url: impl Into<String>,
    ) -> Self {
        Self {
            is_local,
            git_branch: git_branch.into(),
            git_revision: git_revision.into(),
            git_repo_url: git_repo_url.into(),
            created_at: Utc::now(),
            workflow_run_url: None,
            ci_context: None,
            pipeline_start_timestamp: None,
        }
    }

    pub fn is_ci(&self) -> bool {
        !self.is_local
    }
}

/// State bundle plus enter/exit protocol for one run or pipeline.
#[derive(Debug)]
pub struct Context {
    scope: ScopeKind,
    info: ContextInfo,
    state: ContextState,
    report: Option<Report>,
    engine: Option<EngineHandle>,
    status_sink: Arc<dyn StatusSink>,
    upload_sink: Arc<dyn UploadSink>,
    storage: ReportStorage,
}

impl Context {
    /// Build the global context. No status is sent here.
    pub fn new_global(
        info: ContextInfo,
        status_sink: Arc<dyn StatusSink>,
        upload_sink: Arc<dyn UploadSink>,
        storage: ReportStorage,
    ) -> Self {
        Self {
            scope: ScopeKind::Global,
            info,
            state: ContextState::Initialized,
            report: None,
            engine: None,
            status_sink,
            upload_sink,
            storage,
        }
    }

    pub fn attach_engine(&mut self, engine: EngineHandle) {
        self.engine = Some(engine);
    }

    /// Derive the context of one pipeline.
    ///
    /// Identity is copied, `created_at` is fresh and the engine handle is a
    /// sub-scope named `title`. Pipeline contexts never send statuses and
    /// never persist reports.
    pub fn derive_pipeline(&self, title: &str) -> Result<Context> {
        let engine = self.engine.as_ref().ok_or(OrchestratorError::MissingEngine)?;
        let info = ContextInfo {
            created_at: Utc::now(),
            ..self.info.clone()
        };
        Ok(Context {
            scope: ScopeKind::Pipeline,
            info,
            state: ContextState::Initialized,
            report: None,
            engine: Some(engine.pipeline(title)),
            status_sink: Arc::clone(&self.status_sink),
            upload_sink: Arc::clone(&self.upload_sink),
            storage: self.storage.clone(),
        })
    }

    pub fn scope(&self) -> ScopeKind {
        self.scope
    }

    pub fn info(&self) -> &ContextInfo {
        &self.info
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn engine(&self) -> Option<&EngineHandle> {
        self.engine.as_ref()
    }

    /// Name of the run; also the commit-status context label.
    pub fn main_pipeline_name(&self) -> String {
        format!("CI for {}", self.info.git_repo_url)
    }

    /// Attach the report. Allowed once; moves the state to
    /// `SUCCESSFUL` or `FAILURE` according to the report.
    pub fn attach_report(&mut self, report: Report) -> Result<()> {
        if self.report.is_some() {
            return Err(OrchestratorError::ReportAlreadyAttached);
        }
        self.state = if report.success() {
            ContextState::Successful
        } else {
            ContextState::Failure
        };
        self.report = Some(report);
        Ok(())
    }

    pub fn github_commit_status(&self) -> CommitStatus {
        CommitStatus {
            sha: self.info.git_revision.clone(),
            state: github_state(self.state).to_string(),
            target_url: self.info.workflow_run_url.clone(),
            description: state_description(self.state).to_string(),
            context: self.main_pipeline_name(),
            should_send: self.info.is_ci() && self.scope == ScopeKind::Global,
            repo: self.info.git_repo_url.clone(),
        }
    }

    /// Send the status reflecting the current state.
    pub async fn notify_status(&self) {
        let status = self.github_commit_status();
        update_commit_status_check(self.status_sink.as_ref(), &status).await;
    }

    /// Start of the scope: `RUNNING` plus a status update.
    pub async fn enter(&mut self) -> Result<()> {
        if self.engine.is_none() {
            return Err(OrchestratorError::MissingEngine);
        }
        self.state = ContextState::Running;
        info!(context = %self.main_pipeline_name(), scope = %self.scope, "context entered");
        self.notify_status().await;
        Ok(())
    }

    /// End of the scope. Never fails and never re-raises `outcome`'s error.
    ///
    /// Returns the final state after the last status update was sent.
    pub async fn exit(&mut self, outcome: Result<()>) -> ContextState {
        match outcome {
            Err(err) => {
                error!(
                    context = %self.main_pipeline_name(),
                    scope = %self.scope,
                    error = ?err,
                    "An error got handled by the {} context",
                    self.scope
                );
                self.state = ContextState::Error;
            }
            Ok(()) if self.report.is_none() => {
                error!(
                    context = %self.main_pipeline_name(),
                    "No test report was provided. This is probably due to an upstream error"
                );
                self.state = ContextState::Error;
            }
            Ok(()) => self.teardown().await,
        }

        self.notify_status().await;
        info!(context = %self.main_pipeline_name(), state = %self.state, "context closed");
        self.state
    }

    /// Run `body` between [`enter`](Self::enter) and [`exit`](Self::exit).
    ///
    /// Only a failing `enter` is returned as an error; everything `body`
    /// does ends up in the returned state.
    pub async fn scoped<F>(&mut self, body: F) -> Result<ContextState>
    where
        F: for<'a> FnOnce(&'a mut Context) -> BoxFuture<'a, Result<()>>,
    {
        self.enter().await?;
        let outcome = body(self).await;
        Ok(self.exit(outcome).await)
    }

    /// Render, persist and (for CI runs) upload the attached report.
    ///
    /// Failures here are logged and leave the state untouched.
    async fn teardown(&mut self) {
        if let Some(engine) = self.engine.take() {
            self.engine = Some(engine.pipeline(TEARDOWN_SCOPE));
        }

        let Some(report) = &self.report else {
            return;
        };

        if self.scope == ScopeKind::Pipeline {
            info!(
                pipeline = %self.engine.as_ref().map(|e| e.label()).unwrap_or_default(),
                success = report.success(),
                results = report.results.len(),
                "pipeline report ready"
            );
            return;
        }

        println!("{}", report.render());

        let json = match report.to_json() {
            Ok(json) => json,
            Err(err) => {
                error!(error = %err, "serializing the test report failed");
                return;
            }
        };
        info!(report = %json, "test report");

        let branch = &self.info.git_branch;
        let revision = &self.info.git_revision;
        let local_path = local_report_path(&self.storage.reports_dir, branch, revision);

        if let Err(err) = write_report(&local_path, &json).await {
            error!(path = %local_path.display(), error = %err, "writing the test report failed");
            return;
        }
        info!(path = %local_path.display(), "test report written");

        if !report.should_be_saved() {
            return;
        }

        let Some(bucket) = self.storage.bucket.as_deref() else {
            error!("TEST_REPORTS_BUCKET_NAME is not set; the report was not uploaded");
            return;
        };
        let key = remote_report_key(&self.storage.upload_prefix, branch, revision);

        match self.upload_sink.upload(&local_path, &key, bucket).await {
            Ok(0) => info!(%bucket, %key, "test report uploaded"),
            Ok(code) => error!(%bucket, %key, exit_code = code, "Uploading the report to S3 failed."),
            Err(err) => error!(%bucket, %key, error = ?err, "Uploading the report to S3 failed."),
        }
    }
}

async fn write_report(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, json).await?;
    Ok(())
}
