// src/coordinator.rs

//! Fan-out/join of the configured pipelines inside the global scope.

use std::path::PathBuf;

use tracing::{error, info};

use crate::config::{ConfigFile, PipelineConfig};
use crate::context::Context;
use crate::errors::{OrchestratorError, Result};
use crate::pipeline::Pipeline;
use crate::report::Report;
use crate::step::StepResult;
use crate::types::{ContextState, ScopeKind};

/// Runs every configured pipeline once per orchestration run.
#[derive(Debug, Clone)]
pub struct Coordinator {
    pipelines: Vec<PipelineConfig>,
    root_dir: PathBuf,
}

impl Coordinator {
    pub fn new(pipelines: Vec<PipelineConfig>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipelines,
            root_dir: root_dir.into(),
        }
    }

    pub fn from_config(cfg: &ConfigFile, root_dir: impl Into<PathBuf>) -> Self {
        Self::new(cfg.pipelines.clone(), root_dir)
    }

    /// Open the scope of `context`, run all pipelines concurrently, attach
    /// the global report and close the scope.
    ///
    /// Returns the final state of `context`. Only a failing scope entry
    /// (no engine attached) is an error.
    pub async fn run(self, context: &mut Context) -> Result<ContextState> {
        context
            .scoped(move |ctx| {
                Box::pin(async move {
                    let pipelines = self
                        .pipelines
                        .iter()
                        .map(|cfg| Pipeline::from_config(ctx, cfg, &self.root_dir))
                        .collect::<Result<Vec<_>>>()?;

                    let results = run_pipelines(pipelines).await?;
                    let report = Report::new(ScopeKind::Global, ctx.info(), results);
                    ctx.attach_report(report)
                })
            })
            .await
    }
}

/// Launch every pipeline as its own task and wait for all of them.
///
/// Results are flattened in launch order, then step order. A failing or
/// panicking pipeline never cancels its siblings; the first error (in
/// launch order) is returned once every task has finished.
pub async fn run_pipelines(pipelines: Vec<Pipeline>) -> Result<Vec<StepResult>> {
    let handles: Vec<_> = pipelines
        .into_iter()
        .map(|mut pipeline| {
            let title = pipeline.title().to_string();
            let handle = tokio::spawn(async move { pipeline.run().await });
            (title, handle)
        })
        .collect();

    info!(pipelines = handles.len(), "pipelines launched");

    let mut results = Vec::new();
    let mut first_error = None;

    for (title, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(OrchestratorError::PipelineTask(format!("{title}: {join_err}"))),
        };

        match outcome {
            Ok(pipeline_results) => results.extend(pipeline_results),
            Err(err) => {
                error!(pipeline = %title, error = %err, "pipeline did not complete");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(results),
    }
}
