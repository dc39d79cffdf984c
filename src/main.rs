mod analytics;
mod api;
mod app_system;
mod commands;
mod config;
mod domain;
mod error;
mod feedback;
mod ingest;
mod join;
mod output;
mod poller;
mod pricing;
mod reconciler;
mod session;
mod store;
mod views;

#[cfg(test)]
mod mock_framework;

use clap::Parser;
use tracing::error;

use crate::app_system::setup_tracing;
use crate::commands::Cli;

#[tokio::main]
async fn main() {
    // Setup tracing once for the entire application
    setup_tracing();

    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        error!(error = %e, "Command failed");
        // Failed mutations have already been reported through the notifier.
        if !matches!(e, error::AppError::Mutation(_)) {
            output::print_error(&e.to_string());
        }
        std::process::exit(1);
    }
}
