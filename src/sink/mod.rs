// src/sink/mod.rs

//! External collaborators the orchestrator reports to.
//!
//! - [`StatusSink`] receives commit-status updates (GitHub in production).
//! - [`UploadSink`] stores serialized reports durably (S3 in production).
//!
//! Neither may fail the run: errors are logged and swallowed by the
//! helpers in this module and by the context teardown.

pub mod github;
pub mod storage;

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::exec::BoxFuture;

pub use github::GhCliStatusSink;
pub use storage::AwsCliUploadSink;

/// One commit-status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatus {
    pub sha: String,
    /// `pending`, `error`, `success` or `failure`.
    pub state: String,
    pub target_url: Option<String>,
    pub description: String,
    /// Status context label shown on the commit.
    pub context: String,
    pub should_send: bool,
    /// `owner/name` of the repository the commit belongs to.
    pub repo: String,
}

/// Receives commit-status updates.
pub trait StatusSink: Send + Sync + fmt::Debug {
    fn send<'a>(&'a self, status: &'a CommitStatus) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Stores a local file under `key` in `bucket`; returns the uploader's exit code.
pub trait UploadSink: Send + Sync + fmt::Debug {
    fn upload<'a>(
        &'a self,
        local_path: &'a Path,
        key: &'a str,
        bucket: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<i32>>;
}

/// Where and how reports are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportStorage {
    /// Root of local report files.
    pub reports_dir: PathBuf,
    /// Key prefix for uploaded reports.
    pub upload_prefix: String,
    /// Upload bucket; uploads are skipped when absent.
    pub bucket: Option<String>,
}

impl Default for ReportStorage {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("test_reports"),
            upload_prefix: "test_report".to_string(),
            bucket: None,
        }
    }
}

/// Send `status` through `sink` unless `should_send` is false.
///
/// Never fails: sink errors are logged and the run carries on.
pub async fn update_commit_status_check(sink: &dyn StatusSink, status: &CommitStatus) {
    if !status.should_send {
        debug!(sha = %status.sha, state = %status.state, "commit status not sent (should_send = false)");
        return;
    }

    match sink.send(status).await {
        Ok(()) => info!(
            "Created {} status for commit {} on Github in {} context.",
            status.state, status.sha, status.context
        ),
        Err(err) => error!(
            sha = %status.sha,
            state = %status.state,
            error = ?err,
            "No commit status check sent, the connection to Github API failed"
        ),
    }
}
