// src/main.rs

use ci_orchestrator::types::ContextState;
use ci_orchestrator::{cli, logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match run_main().await {
        Ok(None) | Ok(Some(ContextState::Successful)) => {}
        Ok(Some(_)) => std::process::exit(1),
        Err(err) => {
            eprintln!("ci-orchestrator error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<Option<ContextState>> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
