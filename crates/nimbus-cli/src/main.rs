//! Nimbus CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nimbus_api::{ApiClient, ApiConfig};
use nimbus_cli::cli::{Cli, Commands};
use nimbus_cli::commands::{InstanceCommand, TaskCommand};
use nimbus_cli::output::OutputFormat;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), nimbus_cli::CliError> {
    let client = ApiClient::new(ApiConfig {
        base_url: cli.api_url,
        token: cli.token,
        project: cli.project,
        region: cli.region,
    })?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Instance { command } => {
            let cmd = InstanceCommand::new(&client);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Task { command } => {
            let cmd = TaskCommand::new(&client);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
    }

    Ok(())
}
