//! Error types for the ingestion library
//!
//! Each layer has its own error so callers can tell apart what aborts a run
//! ([`IngestionError`]) from what only ends up as a warning on the summary
//! ([`FetchFailure`], [`StoreError`], [`MappingError`] below the channel level).

use std::time::Duration;
use thiserror::Error;

use crate::client::ResourceKind;

/// Failure reported by a [`ContentApi`](crate::client::ContentApi) implementation
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{resource} request returned HTTP {status}: {message}")]
    Status {
        resource: ResourceKind,
        status: u16,
        message: String,
    },

    #[error("Malformed {resource} response: {message}")]
    Decode {
        resource: ResourceKind,
        message: String,
    },
}

impl ApiError {
    /// HTTP status code, when the remote API answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode { .. } => None,
        }
    }
}

/// Why a single page fetch failed
#[derive(Error, Debug)]
pub enum FetchCause {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// A page of a listing could not be fetched; the listing stops here
#[derive(Error, Debug)]
#[error("failed to fetch page {page_index} of {resource}: {cause}")]
pub struct FetchFailure {
    pub resource: ResourceKind,
    pub page_index: usize,
    pub cause: FetchCause,
}

impl FetchFailure {
    pub fn new(resource: ResourceKind, page_index: usize, cause: FetchCause) -> Self {
        Self {
            resource,
            page_index,
            cause,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, FetchCause::Timeout(_))
    }
}

/// A payload was not shaped like an API resource at all
#[derive(Error, Debug)]
#[error("cannot map {entity} payload: {reason}")]
pub struct MappingError {
    pub entity: &'static str,
    pub reason: String,
}

impl MappingError {
    pub fn new(entity: &'static str, reason: impl Into<String>) -> Self {
        Self {
            entity,
            reason: reason.into(),
        }
    }
}

/// Storage failure (connection, schema or a single upsert)
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} record has an empty natural key")]
    MissingNaturalKey { entity: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Failed to serialize column value: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Read-query failure, shown to the operator verbatim
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Empty SQL query")]
    Empty,

    #[error("Invalid SQL syntax: {0}")]
    Syntax(String),

    #[error("Query not allowed: {0}")]
    Forbidden(String),

    #[error("Query timeout exceeded ({0:?})")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors that abort a whole ingestion run
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Failed to fetch channel {channel_id}: {source}")]
    Fetch {
        channel_id: String,
        #[source]
        source: FetchFailure,
    },

    #[error("Failed to map channel {channel_id}: {source}")]
    Mapping {
        channel_id: String,
        #[source]
        source: MappingError,
    },

    #[error("Failed to store channel {channel_id}: {source}")]
    Write {
        channel_id: String,
        #[source]
        source: StoreError,
    },
}

impl IngestionError {
    /// Whether re-running the same ingestion could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestionError::ChannelNotFound(_) | IngestionError::Mapping { .. } => false,
            IngestionError::Fetch { .. } | IngestionError::Write { .. } => true,
        }
    }
}
