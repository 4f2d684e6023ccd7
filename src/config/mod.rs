// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed pipeline file model (`model.rs`).
//! - Load a pipeline file from disk (`loader.rs`).
//! - Validate it (`validate.rs`).
//! - Resolve environment-derived settings (`settings.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{config_root_dir, default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, PipelineConfig, RawConfigFile, RunSection, StepConfig};
pub use settings::RunSettings;
pub use validate::parse_duration;
