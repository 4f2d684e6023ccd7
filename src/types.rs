use std::fmt;

use crate::errors::{OrchestratorError, Result};

/// Exit code a unit uses to say "no work found" (pytest convention).
pub const NO_WORK_EXIT_CODE: i32 = 5;

/// Outcome of a single step or pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepStatus {
    Success,
    Failure,
    Skipped,
}

impl StepStatus {
    /// Map a unit's exit code to a status.
    ///
    /// Only `0`, `1` and [`NO_WORK_EXIT_CODE`] are mapped; anything else is a
    /// configuration fault.
    pub fn from_exit_code(exit_code: i32) -> Result<Self> {
        match exit_code {
            0 => Ok(StepStatus::Success),
            1 => Ok(StepStatus::Failure),
            NO_WORK_EXIT_CODE => Ok(StepStatus::Skipped),
            other => Err(OrchestratorError::UnmappedExitCode(other)),
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(status_label(*self))
    }
}

/// Human label for a status, as shown in the rendered report.
pub fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Success => "Successful",
        StepStatus::Failure => "Failed",
        StepStatus::Skipped => "Skipped",
    }
}

/// Lifecycle state of a [`Context`](crate::context::Context).
///
/// `Initialized -> Running -> {Successful | Failure | Error}`; `Error` is
/// reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Initialized,
    Running,
    Error,
    Successful,
    Failure,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContextState::Initialized => "INITIALIZED",
            ContextState::Running => "RUNNING",
            ContextState::Error => "ERROR",
            ContextState::Successful => "SUCCESSFUL",
            ContextState::Failure => "FAILURE",
        };
        f.write_str(s)
    }
}

/// Commit-status state string sent to the status sink.
pub fn github_state(state: ContextState) -> &'static str {
    match state {
        ContextState::Initialized | ContextState::Running => "pending",
        ContextState::Error => "error",
        ContextState::Successful => "success",
        ContextState::Failure => "failure",
    }
}

/// Commit-status description sent alongside [`github_state`].
pub fn state_description(state: ContextState) -> &'static str {
    match state {
        ContextState::Initialized => "Tests are being initialized...",
        ContextState::Running => "Tests are running...",
        ContextState::Error => "Something went wrong while running the tests.",
        ContextState::Successful => "All tests ran successfully.",
        ContextState::Failure => "Test failed.",
    }
}

/// Whether a context covers the whole run or a single pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Pipeline,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Global => f.write_str("global"),
            ScopeKind::Pipeline => f.write_str("pipeline"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_map_to_statuses() {
        assert_eq!(StepStatus::from_exit_code(0).unwrap(), StepStatus::Success);
        assert_eq!(StepStatus::from_exit_code(1).unwrap(), StepStatus::Failure);
        assert_eq!(StepStatus::from_exit_code(5).unwrap(), StepStatus::Skipped);
    }

    #[test]
    fn unmapped_exit_code_is_a_fault() {
        match StepStatus::from_exit_code(2) {
            Err(OrchestratorError::UnmappedExitCode(2)) => {}
            other => panic!("expected UnmappedExitCode(2), got {other:?}"),
        }
        assert!(StepStatus::from_exit_code(-1).is_err());
        assert!(StepStatus::from_exit_code(137).is_err());
    }

    #[test]
    fn pending_states_share_github_state() {
        assert_eq!(github_state(ContextState::Initialized), "pending");
        assert_eq!(github_state(ContextState::Running), "pending");
        assert_eq!(github_state(ContextState::Failure), "failure");
        assert_ne!(
            state_description(ContextState::Initialized),
            state_description(ContextState::Running)
        );
    }
}
