//! ytwh CLI - Main entry point

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use ytwh_cli::{Cli, Commands};
use ytwh_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Verbose mode logs debug to the console, otherwise only warnings;
    // LOG_* environment variables take precedence either way
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("ytwh")
        .build();
    let log_config = log_config
        .merge_env()
        .context("Invalid logging configuration in LOG_* environment variables")?;

    // Flushes buffered file logs when main returns
    let _guard = init_logging(&log_config).context("Failed to initialize logging")?;

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

async fn execute_command(cli: &Cli) -> ytwh_cli::Result<()> {
    match &cli.command {
        Commands::Ingest { channel_id, format } => {
            let cancel = ytwh_cli::commands::ingest::cancel_on_interrupt();
            ytwh_cli::commands::ingest::run(cli, channel_id, *format, &cancel).await
        },
        Commands::Query {
            sql,
            format,
            no_header,
        } => ytwh_cli::commands::query::run(&cli.database_url, sql, *format, *no_header).await,
        Commands::InitDb => ytwh_cli::commands::init_db::run(&cli.database_url).await,
        Commands::Stats { format } => {
            ytwh_cli::commands::stats::run(&cli.database_url, *format).await
        },
    }
}
