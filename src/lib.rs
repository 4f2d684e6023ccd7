// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod errors;
pub mod exec;
pub mod git;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod sink;
pub mod step;
pub mod types;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RunSettings, config_root_dir, load_and_validate};
use crate::context::{Context, ContextInfo};
use crate::coordinator::Coordinator;
use crate::exec::ProcessEngine;
use crate::sink::{AwsCliUploadSink, GhCliStatusSink, ReportStorage};
use crate::types::ContextState;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and environment settings
/// - git discovery
/// - the global context with its GitHub status and S3 upload sinks
/// - the coordinator running every pipeline
///
/// Returns `None` for a dry run, otherwise the final state of the global
/// context.
pub async fn run(args: CliArgs) -> Result<Option<ContextState>> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading pipeline file {}", config_path.display()))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(None);
    }

    let settings = RunSettings::from_env();
    debug!(?settings, "resolved environment settings");
    let root_dir = config_root_dir(&config_path);

    let git_branch = match settings.git_branch.clone() {
        Some(branch) => branch,
        None => git::current_branch(&root_dir).await.context("discovering git branch")?,
    };
    let git_revision = match settings.git_revision.clone() {
        Some(revision) => revision,
        None => git::current_revision(&root_dir).await.context("discovering git revision")?,
    };
    let git_repo_url = match settings.repo.clone().or_else(|| cfg.run.repo.clone()) {
        Some(repo) => repo,
        None => match git::origin_repo(&root_dir).await {
            Ok(repo) => repo,
            Err(err) => {
                warn!(error = %err, "repository unknown; set [run].repo or GITHUB_REPOSITORY");
                "local".to_string()
            }
        },
    };

    let mut info = ContextInfo::new(
        args.local || settings.is_local,
        git_branch,
        git_revision,
        git_repo_url,
    );
    info.workflow_run_url = settings.workflow_run_url.clone();
    info.ci_context = settings.ci_context.clone();
    info.pipeline_start_timestamp = settings.pipeline_start_timestamp;

    let storage = ReportStorage {
        reports_dir: args.reports_dir.clone().unwrap_or_else(|| cfg.run.reports_dir.clone()),
        upload_prefix: cfg.run.upload_prefix.clone(),
        bucket: settings.bucket.clone(),
    };

    let mut context = Context::new_global(
        info,
        Arc::new(GhCliStatusSink::new(settings.github_token.clone())),
        Arc::new(AwsCliUploadSink::new()),
        storage,
    );
    context.attach_engine(ProcessEngine::handle(context.main_pipeline_name()));

    info!(
        context = %context.main_pipeline_name(),
        local = context.info().is_local,
        branch = %context.info().git_branch,
        revision = %context.info().git_revision,
        "starting run"
    );

    // Initial "pending" status, sent before the scope opens.
    context.notify_status().await;

    let state = Coordinator::from_config(&cfg, root_dir).run(&mut context).await?;
    Ok(Some(state))
}

/// Simple dry-run output: print pipelines, steps and commands.
fn print_dry_run(cfg: &ConfigFile) {
    println!("ci-orchestrator dry-run");
    if let Some(repo) = &cfg.run.repo {
        println!("  run.repo = {repo}");
    }
    println!("  run.reports_dir = {}", cfg.run.reports_dir.display());
    println!("  run.upload_prefix = {}", cfg.run.upload_prefix);
    println!();

    println!("pipelines ({}):", cfg.pipelines.len());
    for pipeline in &cfg.pipelines {
        println!("  - {}", pipeline.title);
        for step in &pipeline.steps {
            println!("      step: {}", step.title);
            if let Some(reason) = &step.skip {
                println!("        skip: {reason}");
                continue;
            }
            println!("        cmd: {}", step.cmd);
            if let Some(image) = &step.image {
                println!("        image: {image}");
            }
            if let Some(workdir) = &step.workdir {
                println!("        workdir: {}", workdir.display());
            }
            if !step.env.is_empty() {
                println!("        env: {:?}", step.env);
            }
            if let Some(timeout) = &step.timeout {
                println!("        timeout: {timeout}");
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
