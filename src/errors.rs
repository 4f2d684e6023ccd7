// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::exec::EngineError;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Execution engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("No step status is mapped to exit code {0}")]
    UnmappedExitCode(i32),

    #[error("No execution engine is attached to the context")]
    MissingEngine,

    #[error("A report is already attached to this context")]
    ReportAlreadyAttached,

    #[error("Pipeline task did not complete: {0}")]
    PipelineTask(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, OrchestratorError>;
