//! Remote listing capability
//!
//! [`ContentApi`] is the seam between the pipeline and the content provider:
//! one `list` call returns one page of raw items plus an optional continuation
//! token. [`YouTubeClient`] implements it against the YouTube Data API v3.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::HarvestConfig;
use crate::error::ApiError;

/// Listing endpoints the harvester reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Channels,
    PlaylistItems,
    Videos,
    CommentThreads,
}

impl ResourceKind {
    /// URL path segment below the API root
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Channels => "channels",
            ResourceKind::PlaylistItems => "playlistItems",
            ResourceKind::Videos => "videos",
            ResourceKind::CommentThreads => "commentThreads",
        }
    }

    /// Value of the `part` parameter, i.e. which sub-objects the API returns
    pub fn parts(self) -> &'static str {
        match self {
            ResourceKind::Channels | ResourceKind::Videos => "snippet,contentDetails,statistics",
            ResourceKind::PlaylistItems => "snippet,contentDetails",
            ResourceKind::CommentThreads => "snippet",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Which items of a resource to list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListFilter {
    Id(String),
    PlaylistId(String),
    VideoId(String),
}

impl ListFilter {
    pub fn query_param(&self) -> (&'static str, &str) {
        match self {
            ListFilter::Id(id) => ("id", id),
            ListFilter::PlaylistId(id) => ("playlistId", id),
            ListFilter::VideoId(id) => ("videoId", id),
        }
    }

    pub fn value(&self) -> &str {
        self.query_param().1
    }
}

/// A single `list` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub resource: ResourceKind,
    pub filter: ListFilter,
    pub page_token: Option<String>,
    pub max_results: Option<u32>,
}

impl ListRequest {
    pub fn channel(channel_id: impl Into<String>) -> Self {
        Self {
            resource: ResourceKind::Channels,
            filter: ListFilter::Id(channel_id.into()),
            page_token: None,
            max_results: None,
        }
    }

    pub fn playlist_items(playlist_id: impl Into<String>, page_size: u32) -> Self {
        Self {
            resource: ResourceKind::PlaylistItems,
            filter: ListFilter::PlaylistId(playlist_id.into()),
            page_token: None,
            max_results: Some(page_size),
        }
    }

    pub fn video(video_id: impl Into<String>) -> Self {
        Self {
            resource: ResourceKind::Videos,
            filter: ListFilter::Id(video_id.into()),
            page_token: None,
            max_results: None,
        }
    }

    pub fn comment_threads(video_id: impl Into<String>, page_size: u32) -> Self {
        Self {
            resource: ResourceKind::CommentThreads,
            filter: ListFilter::VideoId(video_id.into()),
            page_token: None,
            max_results: Some(page_size),
        }
    }

    /// Same request positioned at another page
    pub fn at_page(&self, page_token: Option<String>) -> Self {
        Self {
            page_token,
            ..self.clone()
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Paginated listing capability of the content provider
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn list(&self, request: &ListRequest) -> Result<ListPage, ApiError>;
}

/// HTTP client for the YouTube Data API v3
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl YouTubeClient {
    pub fn new(config: &HarvestConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("ytwh/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn query_params(&self, request: &ListRequest) -> Vec<(&'static str, String)> {
        let (filter_key, filter_value) = request.filter.query_param();
        let mut params = vec![
            ("part", request.resource.parts().to_string()),
            (filter_key, filter_value.to_string()),
        ];

        if let Some(max_results) = request.max_results {
            params.push(("maxResults", max_results.to_string()));
        }
        if let Some(token) = &request.page_token {
            params.push(("pageToken", token.clone()));
        }
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }

        params
    }
}

#[async_trait]
impl ContentApi for YouTubeClient {
    async fn list(&self, request: &ListRequest) -> Result<ListPage, ApiError> {
        let url = format!("{}/{}", self.base_url, request.resource.path());
        debug!(
            resource = %request.resource,
            filter = request.filter.value(),
            page_token = ?request.page_token,
            "Listing"
        );

        let response = self
            .client
            .get(&url)
            .query(&self.query_params(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                resource: request.resource,
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response.json::<ListPage>().await.map_err(|e| ApiError::Decode {
            resource: request.resource,
            message: e.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

/// Pull the human-readable part out of a Google API error body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.errors.first() {
            Some(detail) if !detail.reason.is_empty() => {
                format!("{} ({})", envelope.error.message, detail.reason)
            },
            _ => envelope.error.message,
        },
        Err(_) => body.chars().take(200).collect(),
    }
}
