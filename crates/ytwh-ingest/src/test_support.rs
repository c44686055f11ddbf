//! In-memory fakes and payload builders shared by unit tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::client::{ContentApi, ListPage, ListRequest, ResourceKind};
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub enum FakePage {
    Items(Vec<Value>),
    /// Respond with this HTTP status
    Error(u16),
    /// Never answer in any reasonable time
    Stall,
}

/// Scripted [`ContentApi`]: pages are keyed by resource and filter value and
/// chained with `page-N` tokens. Unscripted listings return one empty page.
#[derive(Default)]
pub struct FakeApi {
    pages: HashMap<(ResourceKind, String), Vec<FakePage>>,
    requests: Mutex<Vec<ListRequest>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, resource: ResourceKind, key: &str, pages: Vec<FakePage>) -> Self {
        self.pages.insert((resource, key.to_string()), pages);
        self
    }

    /// Single-page listing
    pub fn with_items(self, resource: ResourceKind, key: &str, items: Vec<Value>) -> Self {
        self.with_pages(resource, key, vec![FakePage::Items(items)])
    }

    pub fn requests(&self) -> Vec<ListRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn calls_for(&self, resource: ResourceKind) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.resource == resource)
            .count()
    }
}

#[async_trait]
impl ContentApi for FakeApi {
    async fn list(&self, request: &ListRequest) -> Result<ListPage, ApiError> {
        self.requests.lock().unwrap().push(request.clone());

        let key = (request.resource, request.filter.value().to_string());
        let Some(pages) = self.pages.get(&key) else {
            return Ok(ListPage::default());
        };

        let index = match &request.page_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .expect("fake page token"),
        };
        let next_page_token = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));

        match pages.get(index).cloned().unwrap_or(FakePage::Items(Vec::new())) {
            FakePage::Items(items) => Ok(ListPage {
                items,
                next_page_token,
            }),
            FakePage::Error(status) => Err(ApiError::Status {
                resource: request.resource,
                status,
                message: "scripted failure".to_string(),
            }),
            FakePage::Stall => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Ok(ListPage::default())
            },
        }
    }
}

pub fn channel_json(id: &str, title: &str, subscribers: u64, uploads: &str) -> Value {
    json!({
        "kind": "youtube#channel",
        "id": id,
        "snippet": { "title": title, "description": format!("About {}", title) },
        "contentDetails": { "relatedPlaylists": { "uploads": uploads } },
        "statistics": { "subscriberCount": subscribers.to_string(), "viewCount": "1000" }
    })
}

pub fn playlist_item_json(video_id: &str) -> Value {
    json!({
        "kind": "youtube#playlistItem",
        "snippet": { "resourceId": { "kind": "youtube#video", "videoId": video_id } },
        "contentDetails": { "videoId": video_id }
    })
}

pub fn video_json(id: &str, title: &str) -> Value {
    json!({
        "kind": "youtube#video",
        "id": id,
        "snippet": {
            "title": title,
            "description": "",
            "tags": ["rust"],
            "publishedAt": "2024-03-01T12:00:00Z",
            "thumbnails": { "high": { "url": format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id) } }
        },
        "statistics": { "viewCount": "10", "likeCount": "2", "commentCount": "3" },
        "contentDetails": { "duration": "PT1M", "caption": "false" }
    })
}

pub fn comment_json(id: &str, text: &str) -> Value {
    json!({
        "kind": "youtube#commentThread",
        "id": id,
        "snippet": {
            "topLevelComment": {
                "snippet": {
                    "textOriginal": text,
                    "authorDisplayName": "@viewer",
                    "publishedAt": "2024-03-02T08:00:00Z"
                }
            }
        }
    })
}
