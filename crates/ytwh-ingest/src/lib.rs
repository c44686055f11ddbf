//! YouTube channel ingestion into a relational warehouse
//!
//! Pulls a channel, every video of its uploads playlist and every top-level
//! comment of those videos from the YouTube Data API, normalizes the payloads
//! and upserts them into SQLite keyed by their natural ids.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ytwh_ingest::{HarvestConfig, IngestionPipeline, Repository, YouTubeClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarvestConfig::from_env()?;
//! let repository = Arc::new(Repository::connect("sqlite:ytwh.db").await?);
//! repository.ensure_schema().await?;
//!
//! let client = Arc::new(YouTubeClient::new(&config)?);
//! let pipeline = IngestionPipeline::new(client, repository.clone(), config);
//!
//! let summary = pipeline.ingest_channel("UC_x5XG1OV2P6uZZ5FSM9Ttw").await?;
//! println!("{} videos, {} comments", summary.videos_written, summary.comments_written);
//!
//! let _names = repository.execute_read_query("SELECT name FROM channels").await?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod client;
pub mod config;
pub mod cursor;
pub mod error;
pub mod mapper;
pub mod models;
pub mod payload;
pub mod pipeline;
pub mod query;
pub mod repository;

#[cfg(test)]
mod test_support;

pub use client::{ContentApi, ListFilter, ListPage, ListRequest, ResourceKind, YouTubeClient};
pub use config::HarvestConfig;
pub use cursor::PageCursor;
pub use error::{ApiError, FetchFailure, IngestionError, MappingError, QueryError, StoreError};
pub use models::{ChannelKey, ChannelRecord, CommentKey, CommentRecord, VideoKey, VideoRecord};
pub use pipeline::{IngestionPipeline, IngestionSummary, IngestionWarning};
pub use query::QueryResults;
pub use repository::{EntityStore, Repository, TableCounts, DEFAULT_DATABASE_URL};
