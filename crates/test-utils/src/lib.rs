pub mod builders;
pub mod fake_engine;
pub mod sinks;

use std::sync::Once;

use ci_orchestrator::logging::LOG_ENV_VAR;
use tracing_subscriber::{fmt, EnvFilter};

pub use fake_engine::{BuiltUnit, FakeEngine, FakeOutcome, FakeUnit};
pub use sinks::{RecordingStatusSink, RecordingUploadSink, Upload};

static INIT: Once = Once::new();

/// Test subscriber writing through the harness capture, so output only shows
/// for failing tests or with `--nocapture`.
///
/// Reads the same variable as the binary, e.g.
/// `CI_ORCHESTRATOR_LOG=ci_orchestrator=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Fail the test if `f` has not finished within [`TEST_DEADLINE`].
pub async fn with_timeout<F: std::future::Future>(f: F) -> F::Output {
    match tokio::time::timeout(TEST_DEADLINE, f).await {
        Ok(out) => out,
        Err(_) => panic!("future still pending after {TEST_DEADLINE:?}"),
    }
}

/// Upper bound for a single fake pipeline run.
pub const TEST_DEADLINE: std::time::Duration = std::time::Duration::from_secs(5);
