//! Harvester configuration
//!
//! Holds the remote API location, page sizes and time limits used by the
//! client, the page cursor and the pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use ytwh_common::{HarvestError, Result};

// ============================================================================
// Configuration Constants
// ============================================================================

/// YouTube Data API v3 root
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page the playlistItems endpoint accepts
pub const PLAYLIST_PAGE_SIZE: u32 = 50;

/// Largest page the commentThreads endpoint accepts
pub const COMMENT_PAGE_SIZE: u32 = 100;

pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Configuration for the harvesting side (API access and pagination)
#[derive(Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Base URL of the content API, without trailing slash
    pub api_base_url: String,
    /// API key appended as `key=` to every request
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub playlist_page_size: u32,
    pub comment_page_size: u32,
    /// Upper bound for a single page fetch, enforced by the page cursor
    pub page_timeout_secs: u64,
    /// Timeout handed to the HTTP client
    pub request_timeout_secs: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            playlist_page_size: PLAYLIST_PAGE_SIZE,
            comment_page_size: COMMENT_PAGE_SIZE,
            page_timeout_secs: DEFAULT_PAGE_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("playlist_page_size", &self.playlist_page_size)
            .field("comment_page_size", &self.comment_page_size)
            .field("page_timeout_secs", &self.page_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl HarvestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables on top of the defaults
    ///
    /// - `YOUTUBE_API_BASE_URL`
    /// - `YOUTUBE_API_KEY`
    /// - `YTWH_PAGE_TIMEOUT_SECS`
    /// - `YTWH_REQUEST_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("YOUTUBE_API_BASE_URL") {
            config = config.with_api_base_url(url);
        }

        if let Ok(key) = std::env::var("YOUTUBE_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }

        if let Ok(secs) = std::env::var("YTWH_PAGE_TIMEOUT_SECS") {
            config.page_timeout_secs = parse_secs("YTWH_PAGE_TIMEOUT_SECS", &secs)?;
        }

        if let Ok(secs) = std::env::var("YTWH_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_secs("YTWH_REQUEST_TIMEOUT_SECS", &secs)?;
        }

        Ok(config)
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set page sizes, clamped to what the endpoints accept
    pub fn with_page_sizes(mut self, playlist: u32, comments: u32) -> Self {
        self.playlist_page_size = playlist.clamp(1, PLAYLIST_PAGE_SIZE);
        self.comment_page_size = comments.clamp(1, COMMENT_PAGE_SIZE);
        self
    }

    /// Timeouts are at least one second; zero would fail every page
    pub fn with_page_timeout(mut self, secs: u64) -> Self {
        self.page_timeout_secs = secs.max(1);
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs.max(1);
        self
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn parse_secs(var: &str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(HarvestError::config(format!(
            "{} must be a positive number of seconds, got '{}'",
            var, value
        ))),
    }
}
