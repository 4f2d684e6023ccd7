#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use ci_orchestrator::config::{ConfigFile, PipelineConfig, RawConfigFile, RunSection, StepConfig};
use ci_orchestrator::context::{Context, ContextInfo};
use ci_orchestrator::exec::EngineHandle;
use ci_orchestrator::sink::ReportStorage;

use crate::sinks::{RecordingStatusSink, RecordingUploadSink};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                run: RunSection::default(),
                pipelines: Vec::new(),
            },
        }
    }

    pub fn with_repo(mut self, repo: &str) -> Self {
        self.config.run.repo = Some(repo.to_string());
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.config.pipelines.push(pipeline);
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PipelineConfig`.
pub struct PipelineConfigBuilder {
    pipeline: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            pipeline: PipelineConfig {
                title: title.to_string(),
                steps: vec![],
            },
        }
    }

    pub fn step(mut self, step: StepConfig) -> Self {
        self.pipeline.steps.push(step);
        self
    }

    /// Shorthand for a plain command step.
    pub fn cmd(self, title: &str, cmd: &str) -> Self {
        self.step(StepConfigBuilder::new(title, cmd).build())
    }

    pub fn build(self) -> PipelineConfig {
        self.pipeline
    }
}

/// Builder for `StepConfig`.
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    pub fn new(title: &str, cmd: &str) -> Self {
        Self {
            step: StepConfig {
                title: title.to_string(),
                kind: None,
                cmd: cmd.to_string(),
                image: None,
                workdir: None,
                env: BTreeMap::new(),
                timeout: None,
                skip: None,
            },
        }
    }

    pub fn kind(mut self, kind: &str) -> Self {
        self.step.kind = Some(kind.to_string());
        self
    }

    pub fn image(mut self, image: &str) -> Self {
        self.step.image = Some(image.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.step.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.step.timeout = Some(timeout.to_string());
        self
    }

    pub fn skip(mut self, reason: &str) -> Self {
        self.step.skip = Some(reason.to_string());
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}

/// A global context wired to recording sinks, plus the sinks themselves.
pub struct TestContext {
    pub context: Context,
    pub status: RecordingStatusSink,
    pub uploads: RecordingUploadSink,
}

/// Builder for a global `Context` backed by recording sinks.
pub struct ContextBuilder {
    info: ContextInfo,
    storage: ReportStorage,
    engine: Option<EngineHandle>,
    status: RecordingStatusSink,
    uploads: RecordingUploadSink,
}

impl ContextBuilder {
    /// CI run on `main` at revision `abc123` of `org/repo`.
    pub fn new() -> Self {
        Self {
            info: ContextInfo::new(false, "main", "abc123", "org/repo"),
            storage: ReportStorage::default(),
            engine: None,
            status: RecordingStatusSink::new(),
            uploads: RecordingUploadSink::new(),
        }
    }

    pub fn local(mut self) -> Self {
        self.info.is_local = true;
        self
    }

    pub fn branch(mut self, branch: &str) -> Self {
        self.info.git_branch = branch.to_string();
        self
    }

    pub fn revision(mut self, revision: &str) -> Self {
        self.info.git_revision = revision.to_string();
        self
    }

    pub fn workflow_run_url(mut self, url: &str) -> Self {
        self.info.workflow_run_url = Some(url.to_string());
        self
    }

    pub fn pipeline_start_timestamp(mut self, ts: i64) -> Self {
        self.info.pipeline_start_timestamp = Some(ts);
        self
    }

    pub fn reports_dir(mut self, dir: &Path) -> Self {
        self.storage.reports_dir = dir.to_path_buf();
        self
    }

    pub fn bucket(mut self, bucket: &str) -> Self {
        self.storage.bucket = Some(bucket.to_string());
        self
    }

    pub fn engine(mut self, engine: EngineHandle) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn status_sink(mut self, sink: RecordingStatusSink) -> Self {
        self.status = sink;
        self
    }

    pub fn upload_sink(mut self, sink: RecordingUploadSink) -> Self {
        self.uploads = sink;
        self
    }

    pub fn build(self) -> TestContext {
        let mut context = Context::new_global(
            self.info,
            Arc::new(self.status.clone()),
            Arc::new(self.uploads.clone()),
            self.storage,
        );
        if let Some(engine) = self.engine {
            context.attach_engine(engine);
        }
        TestContext {
            context,
            status: self.status,
            uploads: self.uploads,
        }
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
