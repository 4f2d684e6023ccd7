// src/config/validate.rs

use std::collections::HashSet;
use std::time::Duration;

use crate::config::model::{ConfigFile, PipelineConfig, RawConfigFile};
use crate::errors::{OrchestratorError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = OrchestratorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.run, raw.pipelines))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_pipelines(cfg)?;
    validate_pipeline_titles(cfg)?;
    for pipeline in &cfg.pipelines {
        validate_steps(pipeline)?;
    }
    Ok(())
}

fn ensure_has_pipelines(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipelines.is_empty() {
        return Err(OrchestratorError::ConfigError(
            "config must contain at least one [[pipeline]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pipeline_titles(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for pipeline in &cfg.pipelines {
        let title = pipeline.title.trim();
        if title.is_empty() {
            return Err(OrchestratorError::ConfigError(
                "every [[pipeline]] needs a non-empty `title`".to_string(),
            ));
        }
        if !seen.insert(title) {
            return Err(OrchestratorError::ConfigError(format!(
                "pipeline '{}' is defined more than once",
                title
            )));
        }
    }
    Ok(())
}

fn validate_steps(pipeline: &PipelineConfig) -> Result<()> {
    if pipeline.steps.is_empty() {
        return Err(OrchestratorError::ConfigError(format!(
            "pipeline '{}' has no [[pipeline.step]] entries",
            pipeline.title
        )));
    }

    for step in &pipeline.steps {
        if step.title.trim().is_empty() {
            return Err(OrchestratorError::ConfigError(format!(
                "pipeline '{}' has a step without a `title`",
                pipeline.title
            )));
        }
        if step.cmd.trim().is_empty() && step.skip.is_none() {
            return Err(OrchestratorError::ConfigError(format!(
                "step '{}' in pipeline '{}' needs a `cmd` (or a `skip` reason)",
                step.title, pipeline.title
            )));
        }
        if let Some(timeout) = &step.timeout {
            parse_duration(timeout).map_err(|e| {
                OrchestratorError::ConfigError(format!(
                    "step '{}' in pipeline '{}' has an invalid `timeout`: {e}",
                    step.title, pipeline.title
                ))
            })?;
        }
    }
    Ok(())
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(OrchestratorError::ConfigError("empty duration string".to_string()));
    }

    // Find the boundary between digits and suffix.
    let idx = s.chars().position(|c| !c.is_ascii_digit()).ok_or_else(|| {
        OrchestratorError::ConfigError(format!("duration '{s}' is missing a unit suffix"))
    })?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part.parse().map_err(|e| {
        OrchestratorError::ConfigError(format!("invalid duration number '{}': {}", num_part, e))
    })?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(OrchestratorError::ConfigError(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            )));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| OrchestratorError::ConfigError(format!("duration '{s}' is too large")))
}
