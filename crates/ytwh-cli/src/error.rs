//! Error types for the ytwh CLI
//!
//! Every variant renders as a user-facing message with a hint on how to fix it.

use thiserror::Error;
use ytwh_common::HarvestError;
use ytwh_ingest::{ApiError, IngestionError, QueryError, StoreError};

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or .env file.")]
    Config(String),

    /// Database could not be opened, migrated or written
    #[error("Database error: {0}. Check --database-url / DATABASE_URL.")]
    Store(#[from] StoreError),

    /// The ingestion run was aborted
    #[error("Ingestion failed: {0}.{hint}", hint = ingestion_hint(.0))]
    Ingestion(#[from] IngestionError),

    /// A read query was rejected or failed
    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    /// HTTP client could not be built
    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Harvest(#[from] HarvestError),
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

fn ingestion_hint(error: &IngestionError) -> &'static str {
    match error {
        IngestionError::ChannelNotFound(_) => " Check the channel id (it starts with 'UC').",
        IngestionError::Fetch { source, .. } if source.is_timeout() => {
            " The API did not answer in time; try again or raise YTWH_PAGE_TIMEOUT_SECS."
        },
        IngestionError::Fetch { .. } => {
            " Check YOUTUBE_API_KEY and your network connection, then run the command again."
        },
        IngestionError::Mapping { .. } => "",
        IngestionError::Write { .. } => " Check that the database is writable.",
    }
}
