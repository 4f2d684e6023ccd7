// src/sink/storage.rs

//! Report upload through the AWS CLI.

use std::path::Path;

use anyhow::Context;
use tokio::process::Command;
use tracing::debug;

use super::UploadSink;
use crate::exec::BoxFuture;

/// Uploads with `aws s3 cp <local> s3://<bucket>/<key>`.
///
/// The exit code of `aws` is the upload result; credentials come from the
/// usual AWS environment.
#[derive(Debug, Clone)]
pub struct AwsCliUploadSink {
    program: String,
}

impl Default for AwsCliUploadSink {
    fn default() -> Self {
        Self {
            program: "aws".to_string(),
        }
    }
}

impl AwsCliUploadSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl UploadSink for AwsCliUploadSink {
    fn upload<'a>(
        &'a self,
        local_path: &'a Path,
        key: &'a str,
        bucket: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<i32>> {
        Box::pin(async move {
            let destination = format!("s3://{bucket}/{key}");
            debug!(local = %local_path.display(), %destination, "uploading report");

            let status = Command::new(&self.program)
                .arg("s3")
                .arg("cp")
                .arg(local_path)
                .arg(&destination)
                .status()
                .await
                .with_context(|| format!("spawning '{}' to upload {}", self.program, local_path.display()))?;

            Ok(status.code().unwrap_or(-1))
        })
    }
}
