use clap::Parser;
use gallery_harvest::config::{Cli, ConfigError, Verbosity};
use gallery_harvest::engine::Pipeline;
use gallery_harvest::network::HttpTransport;
use gallery_harvest::ops::telemetry;
use std::process::ExitCode;
use std::sync::Arc;

// * Exit code for a missing API key (nothing was written)
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();
    telemetry::init_tracing(verbosity.filter_directive(), cli.json_logs);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e @ ConfigError::MissingApiKey) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_USAGE);
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let transport = match HttpTransport::new() {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };

    let result = match Pipeline::open(config, transport).await {
        Ok(mut pipeline) => pipeline.run().await,
        Err(e) => Err(e),
    };

    if verbosity == Verbosity::Debug {
        tracing::debug!(metrics = %telemetry::get_metrics_string(), "Run metrics");
    }

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}
