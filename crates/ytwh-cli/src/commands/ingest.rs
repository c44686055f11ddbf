//! `ytwh ingest` command implementation

use colored::Colorize;
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use ytwh_ingest::config::DEFAULT_API_BASE_URL;
use ytwh_ingest::{HarvestConfig, IngestionPipeline, YouTubeClient};

use super::open_repository;
use crate::error::{CliError, Result};
use crate::output::format_summary;
use crate::{Cli, SummaryFormat};

/// Environment first, then command-line overrides
pub fn harvest_config(cli: &Cli) -> Result<HarvestConfig> {
    let mut config = HarvestConfig::from_env()?;

    if let Some(url) = &cli.api_base_url {
        config = config.with_api_base_url(url.clone());
    }
    if let Some(key) = cli.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
        config = config.with_api_key(key.clone());
    }

    if config.api_key.is_none() && config.api_base_url == DEFAULT_API_BASE_URL {
        return Err(CliError::config(
            "YOUTUBE_API_KEY is not set; the YouTube Data API rejects anonymous requests",
        ));
    }

    Ok(config)
}

/// Token cancelled by the first Ctrl-C; a second one exits immediately
///
/// Installing the handler replaces the default SIGINT behaviour for the rest
/// of the process, so only long-running commands should call this.
pub fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupt received, stopping after the current video");
        eprintln!(
            "{} Stopping after the current video; press Ctrl-C again to abort.",
            "⚠".yellow()
        );
        signal_token.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Aborted");
            process::exit(130);
        }
    });

    cancel
}

pub async fn run(
    cli: &Cli,
    channel_id: &str,
    format: SummaryFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = harvest_config(cli)?;
    let repository = Arc::new(open_repository(&cli.database_url).await?);
    let client = Arc::new(YouTubeClient::new(&config)?);
    let pipeline = IngestionPipeline::new(client, repository.clone(), config);

    info!(channel_id = %channel_id, "Running ingest command");
    let result = pipeline.ingest_channel_with_cancel(channel_id, cancel).await;
    repository.close().await;
    let summary = result?;

    print!("{}", format_summary(&summary, format)?);

    if summary.cancelled {
        eprintln!(
            "{} Interrupted; rows written so far are kept. Run the command again to finish.",
            "⚠".yellow()
        );
    } else if format == SummaryFormat::Table {
        println!("{} Ingestion of {} complete", "✓".green(), channel_id.cyan());
    }

    Ok(())
}
