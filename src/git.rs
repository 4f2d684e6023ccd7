// src/git.rs

//! Git metadata discovery through the `git` CLI.

use std::path::Path;

use anyhow::{Context as _, anyhow};
use tokio::process::Command;
use tracing::debug;

use crate::errors::Result;

/// Branch checked out in `dir` (`git rev-parse --abbrev-ref HEAD`).
pub async fn current_branch(dir: &Path) -> Result<String> {
    git_output(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await
}

/// Commit checked out in `dir` (`git rev-parse HEAD`).
pub async fn current_revision(dir: &Path) -> Result<String> {
    git_output(dir, &["rev-parse", "HEAD"]).await
}

/// `owner/name` of the `origin` remote.
pub async fn origin_repo(dir: &Path) -> Result<String> {
    let url = git_output(dir, &["remote", "get-url", "origin"]).await?;
    Ok(repo_slug(&url))
}

/// Reduce a remote URL to `owner/name`.
///
/// Handles `https://host/owner/name(.git)` and `git@host:owner/name(.git)`;
/// anything else is returned trimmed.
pub fn repo_slug(remote: &str) -> String {
    let remote = remote.trim();
    let path = if let Some((_, rest)) = remote.split_once("://") {
        rest.split_once('/').map_or(rest, |(_, path)| path)
    } else if let Some((_, path)) = remote.split_once(':') {
        path
    } else {
        remote
    };
    let path = path.trim_matches('/');
    path.strip_suffix(".git").unwrap_or(path).to_string()
}

async fn git_output(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .with_context(|| format!("failed to run `git {}`", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("`git {}` failed: {}", args.join(" "), stderr.trim()).into());
    }

    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!(args = ?args, %value, "git query");
    if value.is_empty() {
        return Err(anyhow!("`git {}` returned nothing", args.join(" ")).into());
    }
    Ok(value)
}
