// src/report/mod.rs

//! Aggregated report over a context's step results.
//!
//! - [`Report`] folds results into success/failure/skip partitions and
//!   derives the run's overall success.
//! - [`ReportRecord`] is the canonical JSON record persisted locally and
//!   uploaded for non-local runs.
//! - [`render`] produces the operator-facing console summary.

pub mod render;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::context::ContextInfo;
use crate::errors::Result;
use crate::step::StepResult;
use crate::types::{ScopeKind, StepStatus};

/// Report built once per context, at teardown.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub scope: ScopeKind,
    /// Identity of the owning context at the time the report was built.
    pub context: ContextInfo,
    pub results: Vec<StepResult>,
    pub created_at: DateTime<Utc>,
}

/// JSON shape of a persisted report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    pub run_timestamp: String,
    pub run_duration: f64,
    pub success: bool,
    pub failed_steps: Vec<String>,
    pub successful_steps: Vec<String>,
    pub skipped_steps: Vec<String>,
    pub gha_workflow_run_url: Option<String>,
    pub pipeline_start_timestamp: Option<i64>,
    pub pipeline_end_timestamp: i64,
    pub pipeline_duration: i64,
    pub git_branch: String,
    pub git_revision: String,
    pub ci_context: Option<String>,
}

impl Report {
    pub fn new(scope: ScopeKind, context: &ContextInfo, results: Vec<StepResult>) -> Self {
        Self {
            scope,
            context: context.clone(),
            results,
            created_at: Utc::now(),
        }
    }

    fn with_status(&self, status: StepStatus) -> Vec<&StepResult> {
        self.results.iter().filter(|r| r.status == status).collect()
    }

    pub fn failed(&self) -> Vec<&StepResult> {
        self.with_status(StepStatus::Failure)
    }

    pub fn successful(&self) -> Vec<&StepResult> {
        self.with_status(StepStatus::Success)
    }

    pub fn skipped(&self) -> Vec<&StepResult> {
        self.with_status(StepStatus::Skipped)
    }

    /// True when nothing failed **and** at least one result exists.
    ///
    /// An empty report is never successful: zero results usually means the
    /// pipelines were never wired up.
    pub fn success(&self) -> bool {
        self.failed().is_empty() && !self.results.is_empty()
    }

    pub fn should_be_saved(&self) -> bool {
        !self.context.is_local
    }

    /// Seconds between context creation and report creation, never negative.
    pub fn run_duration(&self) -> f64 {
        let delta = self.created_at - self.context.created_at;
        let micros = delta.num_microseconds().unwrap_or(i64::MAX).max(0);
        micros as f64 / 1_000_000.0
    }

    pub fn to_record(&self) -> ReportRecord {
        let names = |results: Vec<&StepResult>| results.into_iter().map(|r| r.kind.clone()).collect();
        let end = (self.created_at.timestamp_millis() as f64 / 1000.0).round() as i64;
        let start = self.context.pipeline_start_timestamp;

        ReportRecord {
            run_timestamp: self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            run_duration: self.run_duration(),
            success: self.success(),
            failed_steps: names(self.failed()),
            successful_steps: names(self.successful()),
            skipped_steps: names(self.skipped()),
            gha_workflow_run_url: self.context.workflow_run_url.clone(),
            pipeline_start_timestamp: start,
            pipeline_end_timestamp: end,
            pipeline_duration: end - start.unwrap_or(0),
            git_branch: self.context.git_branch.clone(),
            git_revision: self.context.git_revision.clone(),
            ci_context: self.context.ci_context.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    pub fn render(&self) -> String {
        render::render(self)
    }
}

/// `<branch with "/" replaced by "_">/<revision>.json`.
pub fn report_suffix(branch: &str, revision: &str) -> PathBuf {
    PathBuf::from(branch.replace('/', "_")).join(format!("{revision}.json"))
}

/// Local path of the report file under `root`.
pub fn local_report_path(root: &Path, branch: &str, revision: &str) -> PathBuf {
    root.join(report_suffix(branch, revision))
}

/// Object-storage key of the report under `prefix`.
pub fn remote_report_key(prefix: &str, branch: &str, revision: &str) -> String {
    let suffix = format!("{}/{revision}.json", branch.replace('/', "_"));
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        suffix
    } else {
        format!("{prefix}/{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn info() -> ContextInfo {
        ContextInfo {
            is_local: false,
            git_branch: "feature/x".into(),
            git_revision: "abc123".into(),
            git_repo_url: "org/repo".into(),
            created_at: Utc::now() - Duration::seconds(10),
            workflow_run_url: Some("https://ci/run/1".into()),
            ci_context: Some("pull_request".into()),
            pipeline_start_timestamp: None,
        }
    }

    fn result(kind: &str, status: StepStatus) -> StepResult {
        StepResult::new(kind, kind, status, None, None)
    }

    #[test]
    fn empty_report_is_not_successful() {
        let report = Report::new(ScopeKind::Global, &info(), vec![]);
        assert!(report.failed().is_empty());
        assert!(!report.success());
    }

    #[test]
    fn single_success_is_successful() {
        let report = Report::new(ScopeKind::Global, &info(), vec![result("A", StepStatus::Success)]);
        assert!(report.success());
        assert!(report.to_record().failed_steps.is_empty());
    }

    #[test]
    fn skipped_only_report_is_successful() {
        let report = Report::new(ScopeKind::Global, &info(), vec![result("A", StepStatus::Skipped)]);
        assert!(report.success());
    }

    #[test]
    fn partitions_keep_order() {
        let report = Report::new(
            ScopeKind::Global,
            &info(),
            vec![
                result("A", StepStatus::Failure),
                result("B", StepStatus::Success),
                result("C", StepStatus::Failure),
                result("D", StepStatus::Skipped),
            ],
        );
        let record = report.to_record();
        assert_eq!(record.failed_steps, vec!["A", "C"]);
        assert_eq!(record.successful_steps, vec!["B"]);
        assert_eq!(record.skipped_steps, vec!["D"]);
        assert!(!record.success);
    }

    #[test]
    fn record_derives_durations() {
        let mut ctx = info();
        ctx.pipeline_start_timestamp = Some(Utc::now().timestamp() - 60);
        let report = Report::new(ScopeKind::Global, &ctx, vec![result("A", StepStatus::Success)]);
        let record = report.to_record();

        assert!(record.run_duration >= 10.0);
        assert!((59..=61).contains(&record.pipeline_duration));
        assert_eq!(record.git_branch, "feature/x");
        assert_eq!(record.ci_context.as_deref(), Some("pull_request"));
    }

    #[test]
    fn missing_start_timestamp_counts_from_zero() {
        let report = Report::new(ScopeKind::Global, &info(), vec![result("A", StepStatus::Success)]);
        let record = report.to_record();
        assert_eq!(record.pipeline_start_timestamp, None);
        assert_eq!(record.pipeline_duration, record.pipeline_end_timestamp);
    }

    #[test]
    fn json_is_stable_across_serializations() {
        let report = Report::new(ScopeKind::Global, &info(), vec![result("A", StepStatus::Success)]);
        let first = report.to_json().unwrap();
        let second = report.to_json().unwrap();
        assert_eq!(first, second);

        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(value["success"], serde_json::Value::Bool(true));
        assert_eq!(value["gha_workflow_run_url"], "https://ci/run/1");
        assert!(value["pipeline_start_timestamp"].is_null());
    }

    #[test]
    fn local_runs_are_not_saved() {
        let mut ctx = info();
        ctx.is_local = true;
        let report = Report::new(ScopeKind::Global, &ctx, vec![]);
        assert!(!report.should_be_saved());
    }

    #[test]
    fn storage_paths_flatten_branch_slashes() {
        assert_eq!(
            local_report_path(Path::new("/reports"), "feature/x/y", "abc"),
            PathBuf::from("/reports/feature_x_y/abc.json")
        );
        assert_eq!(remote_report_key("test_report/", "feature/x", "abc"), "test_report/feature_x/abc.json");
        assert_eq!(remote_report_key("", "main", "abc"), "main/abc.json");
    }
}
