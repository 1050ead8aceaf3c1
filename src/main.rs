use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use workflow_wait::cli::commands::{show_usage, Command, ShowConfigCommand, WorkflowWaitCommand};
use workflow_wait::cli::{Cli, Commands};
use workflow_wait::platform::PlatformClient;
use workflow_wait::telemetry::init_telemetry;
use workflow_wait::workflows::WaitRequest;
use workflow_wait::config;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = config()?;

    init_telemetry(&config.observability)?;

    match cli.command {
        // Default behavior: no subcommand - explain usage
        None => {
            show_usage()?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::WorkflowWait {
            site_env_id,
            max_wait_in_seconds,
            start,
        }) => {
            let client = PlatformClient::new(&config.api)
                .context("Failed to initialize platform client")?;
            let request = WaitRequest::new(site_env_id)
                .with_max_wait(max_wait_in_seconds)
                .with_start(start);
            let command = WorkflowWaitCommand::new(request, Arc::new(client), config.wait.settings());

            tokio::runtime::Runtime::new()?.block_on(async { command.execute().await })
        }
        Some(Commands::Config) => {
            let command = ShowConfigCommand::new(config.clone());
            tokio::runtime::Runtime::new()?.block_on(async { command.execute().await })
        }
    }
}
