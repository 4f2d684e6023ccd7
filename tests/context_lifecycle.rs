// tests/context_lifecycle.rs

mod common;
use crate::common::{read_report, strings};

use ci_orchestrator::errors::OrchestratorError;
use ci_orchestrator::report::Report;
use ci_orchestrator::step::StepResult;
use ci_orchestrator::types::{ContextState, ScopeKind, StepStatus};
use ci_orchestrator_test_utils::builders::ContextBuilder;
use ci_orchestrator_test_utils::{FakeEngine, RecordingStatusSink, init_tracing};

fn result(title: &str, status: StepStatus) -> StepResult {
    StepResult::new(title, title, status, None, None)
}

#[tokio::test]
async fn construction_sends_nothing_and_initial_status_is_pending() {
    let t = ContextBuilder::new()
        .engine(FakeEngine::new("ci").handle())
        .workflow_run_url("https://github.com/org/repo/actions/runs/1")
        .build();

    assert_eq!(t.context.state(), ContextState::Initialized);
    assert!(t.status.sent().is_empty());

    t.context.notify_status().await;
    let sent = t.status.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].state, "pending");
    assert_eq!(sent[0].description, "Tests are being initialized...");
    assert_eq!(sent[0].context, "CI for org/repo");
    assert_eq!(sent[0].sha, "abc123");
    assert_eq!(
        sent[0].target_url.as_deref(),
        Some("https://github.com/org/repo/actions/runs/1")
    );
}

#[tokio::test]
async fn entering_without_engine_fails_fast() {
    let mut t = ContextBuilder::new().build();

    let outcome = t.context.scoped(|_ctx| Box::pin(async { Ok::<(), OrchestratorError>(()) })).await;

    assert!(matches!(outcome, Err(OrchestratorError::MissingEngine)));
    assert_eq!(t.context.state(), ContextState::Initialized);
    assert!(t.status.sent().is_empty());
}

#[tokio::test]
async fn scope_without_report_ends_in_error() {
    init_tracing();
    let mut t = ContextBuilder::new().engine(FakeEngine::new("ci").handle()).build();

    let state = t.context.scoped(|_ctx| Box::pin(async { Ok::<(), OrchestratorError>(()) })).await.unwrap();

    assert_eq!(state, ContextState::Error);
    assert_eq!(t.status.states(), vec!["pending", "error"]);
    assert_eq!(
        t.status.sent()[1].description,
        "Something went wrong while running the tests."
    );
}

#[tokio::test]
async fn body_error_is_suppressed_and_recorded() {
    init_tracing();
    let mut t = ContextBuilder::new().engine(FakeEngine::new("ci").handle()).build();

    let state = t
        .context
        .scoped(|_ctx| Box::pin(async { Err::<(), _>(OrchestratorError::ConfigError("boom".into())) }))
        .await
        .unwrap();

    assert_eq!(state, ContextState::Error);
    assert_eq!(t.status.states(), vec!["pending", "error"]);
}

#[tokio::test]
async fn report_can_be_attached_once() {
    let mut t = ContextBuilder::new().engine(FakeEngine::new("ci").handle()).build();
    let info = t.context.info().clone();

    let first = Report::new(ScopeKind::Global, &info, vec![result("a", StepStatus::Success)]);
    t.context.attach_report(first).unwrap();
    assert_eq!(t.context.state(), ContextState::Successful);

    let second = Report::new(ScopeKind::Global, &info, vec![result("b", StepStatus::Failure)]);
    assert!(matches!(
        t.context.attach_report(second),
        Err(OrchestratorError::ReportAlreadyAttached)
    ));
    assert_eq!(t.context.state(), ContextState::Successful);
    assert_eq!(t.context.report().unwrap().results[0].title, "a");
}

#[tokio::test]
async fn empty_report_is_a_failure() {
    init_tracing();
    let reports = tempfile::tempdir().unwrap();
    let mut t = ContextBuilder::new()
        .engine(FakeEngine::new("ci").handle())
        .reports_dir(reports.path())
        .build();

    let state = t
        .context
        .scoped(|ctx| {
            Box::pin(async move {
                let report = Report::new(ScopeKind::Global, ctx.info(), Vec::new());
                ctx.attach_report(report)
            })
        })
        .await
        .unwrap();

    assert_eq!(state, ContextState::Failure);
    let json = read_report(reports.path(), "main", "abc123");
    assert_eq!(json["success"], false);
    assert!(strings(&json["failed_steps"]).is_empty());
}

#[tokio::test]
async fn unreachable_status_api_is_not_fatal() {
    init_tracing();
    let reports = tempfile::tempdir().unwrap();
    let mut t = ContextBuilder::new()
        .engine(FakeEngine::new("ci").handle())
        .reports_dir(reports.path())
        .status_sink(RecordingStatusSink::failing())
        .build();

    let state = t
        .context
        .scoped(|ctx| {
            Box::pin(async move {
                let report = Report::new(
                    ScopeKind::Global,
                    ctx.info(),
                    vec![result("a", StepStatus::Success)],
                );
                ctx.attach_report(report)
            })
        })
        .await
        .unwrap();

    assert_eq!(state, ContextState::Successful);
    assert_eq!(t.status.states(), vec!["pending", "success"]);
}

#[tokio::test]
async fn report_path_flattens_branch_slashes() {
    init_tracing();
    let reports = tempfile::tempdir().unwrap();
    let mut t = ContextBuilder::new()
        .branch("feature/login")
        .revision("deadbeef")
        .pipeline_start_timestamp(1_700_000_000)
        .engine(FakeEngine::new("ci").handle())
        .reports_dir(reports.path())
        .build();

    t.context
        .scoped(|ctx| {
            Box::pin(async move {
                let report = Report::new(
                    ScopeKind::Global,
                    ctx.info(),
                    vec![result("a", StepStatus::Success)],
                );
                ctx.attach_report(report)
            })
        })
        .await
        .unwrap();

    assert!(reports.path().join("feature_login").join("deadbeef.json").exists());
    let json = read_report(reports.path(), "feature/login", "deadbeef");
    assert_eq!(json["git_branch"], "feature/login");
    assert_eq!(json["pipeline_start_timestamp"], 1_700_000_000);
    let end = json["pipeline_end_timestamp"].as_i64().unwrap();
    assert_eq!(json["pipeline_duration"].as_i64().unwrap(), end - 1_700_000_000);
}

#[tokio::test]
async fn derived_pipeline_context_keeps_identity_and_never_notifies() {
    let t = ContextBuilder::new()
        .workflow_run_url("https://ci.example/run/7")
        .engine(FakeEngine::new("CI for org/repo").handle())
        .build();

    let pipeline = t.context.derive_pipeline("Lint").unwrap();

    assert_eq!(pipeline.scope(), ScopeKind::Pipeline);
    assert_eq!(pipeline.info().git_revision, "abc123");
    assert_eq!(pipeline.info().workflow_run_url.as_deref(), Some("https://ci.example/run/7"));
    assert!(pipeline.info().created_at >= t.context.info().created_at);
    assert_eq!(pipeline.engine().unwrap().label(), "CI for org/repo / Lint");
    assert!(!pipeline.github_commit_status().should_send);

    pipeline.notify_status().await;
    assert!(t.status.sent().is_empty());
}
