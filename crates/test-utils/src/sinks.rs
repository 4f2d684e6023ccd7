use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use ci_orchestrator::exec::BoxFuture;
use ci_orchestrator::sink::{CommitStatus, StatusSink, UploadSink};

/// Records every status that reached the sink.
///
/// Statuses with `should_send == false` never get here.
#[derive(Debug, Clone, Default)]
pub struct RecordingStatusSink {
    sent: Arc<Mutex<Vec<CommitStatus>>>,
    fail: bool,
}

impl RecordingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send records the status and then fails, like a lost connection.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<CommitStatus> {
        self.sent.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.state).collect()
    }
}

impl StatusSink for RecordingStatusSink {
    fn send<'a>(&'a self, status: &'a CommitStatus) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(status.clone());
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            Ok(())
        })
    }
}

/// One recorded upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub local_path: PathBuf,
    pub key: String,
    pub bucket: String,
    /// File contents at upload time.
    pub contents: String,
}

/// Records uploads and answers with a configurable exit code.
#[derive(Debug, Clone, Default)]
pub struct RecordingUploadSink {
    uploads: Arc<Mutex<Vec<Upload>>>,
    exit_code: i32,
}

impl RecordingUploadSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exit_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

impl UploadSink for RecordingUploadSink {
    fn upload<'a>(
        &'a self,
        local_path: &'a Path,
        key: &'a str,
        bucket: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<i32>> {
        Box::pin(async move {
            let contents = tokio::fs::read_to_string(local_path).await?;
            self.uploads.lock().unwrap().push(Upload {
                local_path: local_path.to_path_buf(),
                key: key.to_string(),
                bucket: bucket.to_string(),
                contents,
            });
            Ok(self.exit_code)
        })
    }
}
