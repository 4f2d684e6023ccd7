// src/exec/observe.rs

//! Observation adapter over a [`RunnableUnit`].
//!
//! Normalises engine failures into the three values a step result needs:
//! an integer exit code, captured stdout and captured stderr.

use std::num::ParseIntError;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::backend::{EngineError, RunnableUnit};

static EXIT_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"exit code: (\d+)").expect("exit code pattern is valid")
});

const EXIT_CODE_MARKER: &str = "exit code: ";
const NOT_FOUND_MARKER: &str = "no such file or directory";

/// Extract `N` from a message embedding `"exit code: N"`.
///
/// A message with the marker but no digits maps to `1`; a message without
/// the marker yields `None`. Digits that do not fit an `i32` are an error.
pub fn parse_exit_code(message: &str) -> Option<Result<i32, ParseIntError>> {
    if !message.contains(EXIT_CODE_MARKER) {
        return None;
    }
    let code = match EXIT_CODE_RE.captures(message).and_then(|caps| caps.get(1)) {
        Some(digits) => digits.as_str().parse::<i32>(),
        None => Ok(1),
    };
    Some(code)
}

/// Read the unit's exit code.
///
/// A non-zero exit is a normal outcome and is returned as a value. Errors
/// that carry no exit code at all propagate.
pub async fn with_exit_code(unit: &dyn RunnableUnit) -> Result<i32, EngineError> {
    match unit.exit_code().await {
        Ok(code) => Ok(code),
        Err(EngineError::Exec {
            exit_code: Some(code),
            ..
        }) => Ok(code),
        Err(err @ (EngineError::Exec { .. } | EngineError::Query(_))) => {
            match parse_exit_code(&err.to_string()) {
                Some(Ok(code)) => {
                    debug!(exit_code = code, "exit code recovered from engine error message");
                    Ok(code)
                }
                Some(Err(parse_err)) => Err(EngineError::Query(format!(
                    "exit code out of range ({parse_err}): {err}"
                ))),
                None => Err(err),
            }
        }
        Err(err) => Err(err),
    }
}

/// Captured stdout, or the engine error text when it cannot be read.
pub async fn with_stdout(unit: &dyn RunnableUnit) -> String {
    match unit.stdout().await {
        Ok(out) => out,
        Err(err) => {
            warn!(error = %err, "could not read unit stdout; keeping the error text instead");
            err.to_string()
        }
    }
}

/// Captured stderr, or the engine error text when it cannot be read.
pub async fn with_stderr(unit: &dyn RunnableUnit) -> String {
    match unit.stderr().await {
        Ok(out) => out,
        Err(err) => {
            warn!(error = %err, "could not read unit stderr; keeping the error text instead");
            err.to_string()
        }
    }
}

/// Read a file from inside the unit; `None` when it does not exist.
pub async fn get_file_contents(
    unit: &dyn RunnableUnit,
    path: &str,
) -> Result<Option<String>, EngineError> {
    match unit.file_contents(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(EngineError::NotFound { .. }) => Ok(None),
        Err(EngineError::Query(message)) if message.contains(NOT_FOUND_MARKER) => Ok(None),
        Err(err) => Err(err),
    }
}
