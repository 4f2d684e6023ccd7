// src/pipeline.rs

//! A pipeline: an ordered group of steps under its own pipeline context.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use crate::config::PipelineConfig;
use crate::context::Context;
use crate::errors::{OrchestratorError, Result};
use crate::report::Report;
use crate::step::{CommandStep, Step, StepResult};
use crate::types::ScopeKind;

/// Steps run one after another, in declared order.
///
/// Any infrastructure error from a step stops the pipeline and is returned
/// to the caller unchanged; step failures are data in the results.
pub struct Pipeline {
    title: String,
    context: Context,
    steps: Vec<Arc<dyn Step>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("title", &self.title)
            .field("steps", &self.steps.iter().map(|s| s.title().to_string()).collect::<Vec<_>>())
            .finish()
    }
}

impl Pipeline {
    /// Empty pipeline bound to a context derived from `parent`.
    pub fn new(parent: &Context, title: impl Into<String>) -> Result<Self> {
        let title = title.into();
        let context = parent.derive_pipeline(&title)?;
        Ok(Self {
            title,
            context,
            steps: Vec::new(),
        })
    }

    pub fn with_step(mut self, step: Arc<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    /// Build a pipeline of [`CommandStep`]s from its config table.
    ///
    /// Step working directories are resolved against `root_dir`.
    pub fn from_config(parent: &Context, cfg: &PipelineConfig, root_dir: &Path) -> Result<Self> {
        let mut pipeline = Self::new(parent, cfg.title.clone())?;
        let engine = pipeline
            .context
            .engine()
            .cloned()
            .ok_or(OrchestratorError::MissingEngine)?;

        for step_cfg in &cfg.steps {
            let mut step = CommandStep::new(step_cfg.title.clone(), step_cfg.unit_spec(root_dir)?, engine.clone());
            if let Some(kind) = &step_cfg.kind {
                step = step.with_kind(kind.clone());
            }
            if let Some(reason) = &step_cfg.skip {
                step = step.skipped(reason.clone());
            }
            pipeline.steps.push(Arc::new(step));
        }

        Ok(pipeline)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn steps(&self) -> &[Arc<dyn Step>] {
        &self.steps
    }

    /// Run every step and attach the pipeline report to the pipeline context.
    pub async fn run(&mut self) -> Result<Vec<StepResult>> {
        let span = info_span!("pipeline", title = %self.title);
        async {
            info!(steps = self.steps.len(), "pipeline started");

            let mut results = Vec::with_capacity(self.steps.len());
            for step in &self.steps {
                results.push(step.run().await?);
            }

            let report = Report::new(ScopeKind::Pipeline, self.context.info(), results.clone());
            info!(
                success = report.success(),
                failed = report.failed().len(),
                skipped = report.skipped().len(),
                "pipeline finished"
            );
            self.context.attach_report(report)?;

            Ok::<_, OrchestratorError>(results)
        }
        .instrument(span)
        .await
    }
}
