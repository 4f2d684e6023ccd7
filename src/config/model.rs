// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::Result;
use crate::exec::UnitSpec;

use super::validate::parse_duration;

/// Pipeline file as read from TOML, before validation.
///
/// ```toml
/// [run]
/// repo = "org/repo"
///
/// [[pipeline]]
/// title = "Actions Runner Pipeline"
///
/// [[pipeline.step]]
/// title = "Unit tests"
/// cmd = "pytest"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,

    /// `[[pipeline]]` tables, in launch order.
    #[serde(default, rename = "pipeline")]
    pub pipelines: Vec<PipelineConfig>,
}

/// Validated pipeline file. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub run: RunSection,
    pub pipelines: Vec<PipelineConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(run: RunSection, pipelines: Vec<PipelineConfig>) -> Self {
        Self { run, pipelines }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Repository under test (`owner/name`); `GITHUB_REPOSITORY` wins when set.
    #[serde(default)]
    pub repo: Option<String>,

    /// Root directory for local report files.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// Key prefix for uploaded reports.
    #[serde(default = "default_upload_prefix")]
    pub upload_prefix: String,
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("test_reports")
}

fn default_upload_prefix() -> String {
    "test_report".to_string()
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            repo: None,
            reports_dir: default_reports_dir(),
            upload_prefix: default_upload_prefix(),
        }
    }
}

/// One `[[pipeline]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub title: String,

    /// `[[pipeline.step]]` tables, run in order.
    #[serde(default, rename = "step")]
    pub steps: Vec<StepConfig>,
}

/// One `[[pipeline.step]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    pub title: String,

    /// Name reported in the JSON record; defaults to the title in UpperCamelCase.
    #[serde(default)]
    pub kind: Option<String>,

    /// Shell command to execute. May be empty for skipped steps.
    #[serde(default)]
    pub cmd: String,

    /// Container image; the command runs on the host when absent.
    #[serde(default)]
    pub image: Option<String>,

    /// Working directory, relative to the pipeline file.
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Duration string like `"90s"` or `"10m"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// When set, the step is reported as skipped with this reason.
    #[serde(default)]
    pub skip: Option<String>,
}

impl StepConfig {
    /// Build the unit spec for this step, resolving `workdir` against `root`.
    pub fn unit_spec(&self, root: &Path) -> Result<UnitSpec> {
        let timeout = self.timeout.as_deref().map(parse_duration).transpose()?;
        let workdir = match &self.workdir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        };
        Ok(UnitSpec {
            cmd: self.cmd.clone(),
            image: self.image.clone(),
            workdir,
            env: self.env.clone(),
            timeout,
        })
    }
}
