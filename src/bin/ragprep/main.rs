use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = ragprep::config::StartArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from(args.log()))
        .init();

    match ragprep::cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "{e}");
            ExitCode::FAILURE
        }
    }
}
