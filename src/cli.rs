// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `ci-orchestrator`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ci-orchestrator",
    version,
    about = "Run CI pipelines, report the result to GitHub and store the test report.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    ///
    /// Default: `Pipelines.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CI_ORCHESTRATOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the pipelines, but don't execute any steps.
    #[arg(long)]
    pub dry_run: bool,

    /// Root directory for local report files (overrides `[run].reports_dir`).
    #[arg(long, value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Treat the run as local even when `CI` is set: no commit statuses,
    /// no upload.
    #[arg(long)]
    pub local: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
