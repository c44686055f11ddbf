//! Channel ingestion pipeline
//!
//! Walks channel → uploads playlist → videos → comment threads, mapping every
//! payload and writing it through an [`EntityStore`] top-down so that each
//! row's parent already exists.
//!
//! Only the channel itself can abort a run. Everything below it degrades to an
//! [`IngestionWarning`] on the [`IngestionSummary`]:
//!
//! | Failure | Effect |
//! |---|---|
//! | playlist page fetch | stop enumerating, process ids found so far |
//! | video fetch / video not found | skip that video |
//! | video write | skip that video's comments |
//! | comment page fetch | stop that video's comments |
//! | comment write | skip that comment |
//! | payload not an object | skip that item |

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::{ContentApi, ListRequest};
use crate::config::HarvestConfig;
use crate::cursor::{fetch_page, PageCursor};
use crate::error::IngestionError;
use crate::mapper;
use crate::models::{ChannelKey, VideoKey};
use crate::repository::EntityStore;

/// Non-fatal problem met during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestionWarning {
    PlaylistFetchFailed {
        playlist_id: String,
        page_index: usize,
        reason: String,
    },
    VideoMissing {
        video_id: String,
    },
    VideoFetchFailed {
        video_id: String,
        reason: String,
    },
    MalformedPayload {
        entity: String,
        video_id: Option<String>,
        reason: String,
    },
    VideoWriteFailed {
        video_id: String,
        reason: String,
    },
    CommentFetchFailed {
        video_id: String,
        page_index: usize,
        reason: String,
    },
    CommentWriteFailed {
        video_id: String,
        comment_id: String,
        reason: String,
    },
}

impl IngestionWarning {
    pub fn video_id(&self) -> Option<&str> {
        match self {
            IngestionWarning::PlaylistFetchFailed { .. } => None,
            IngestionWarning::MalformedPayload { video_id, .. } => video_id.as_deref(),
            IngestionWarning::VideoMissing { video_id }
            | IngestionWarning::VideoFetchFailed { video_id, .. }
            | IngestionWarning::VideoWriteFailed { video_id, .. }
            | IngestionWarning::CommentFetchFailed { video_id, .. }
            | IngestionWarning::CommentWriteFailed { video_id, .. } => Some(video_id),
        }
    }
}

impl fmt::Display for IngestionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestionWarning::PlaylistFetchFailed {
                playlist_id,
                page_index,
                reason,
            } => write!(
                f,
                "uploads playlist {} stopped at page {}: {}",
                playlist_id, page_index, reason
            ),
            IngestionWarning::VideoMissing { video_id } => {
                write!(f, "video {} no longer exists", video_id)
            },
            IngestionWarning::VideoFetchFailed { video_id, reason } => {
                write!(f, "video {} could not be fetched: {}", video_id, reason)
            },
            IngestionWarning::MalformedPayload {
                entity,
                video_id: Some(video_id),
                reason,
            } => write!(f, "skipped {} of video {}: {}", entity, video_id, reason),
            IngestionWarning::MalformedPayload {
                entity, reason, ..
            } => write!(f, "skipped {}: {}", entity, reason),
            IngestionWarning::VideoWriteFailed { video_id, reason } => {
                write!(f, "video {} could not be stored: {}", video_id, reason)
            },
            IngestionWarning::CommentFetchFailed {
                video_id,
                page_index,
                reason,
            } => write!(
                f,
                "comments of video {} stopped at page {}: {}",
                video_id, page_index, reason
            ),
            IngestionWarning::CommentWriteFailed {
                video_id,
                comment_id,
                reason,
            } => write!(
                f,
                "comment {} of video {} could not be stored: {}",
                comment_id, video_id, reason
            ),
        }
    }
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionSummary {
    pub run_id: Uuid,
    pub channel_id: String,
    pub channels_written: u64,
    pub videos_written: u64,
    pub comments_written: u64,
    pub warnings: Vec<IngestionWarning>,
    /// Stopped early by the caller's cancellation token
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestionSummary {
    fn start(run_id: Uuid, channel_id: &str) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            channel_id: channel_id.to_string(),
            channels_written: 0,
            videos_written: 0,
            comments_written: 0,
            warnings: Vec::new(),
            cancelled: false,
            started_at: now,
            finished_at: now,
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    fn warn(&mut self, warning: IngestionWarning) {
        warn!(video_id = ?warning.video_id(), "{}", warning);
        self.warnings.push(warning);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Ingests one channel at a time; clone freely to run channels concurrently
#[derive(Clone)]
pub struct IngestionPipeline {
    api: Arc<dyn ContentApi>,
    store: Arc<dyn EntityStore>,
    config: HarvestConfig,
}

impl IngestionPipeline {
    pub fn new(api: Arc<dyn ContentApi>, store: Arc<dyn EntityStore>, config: HarvestConfig) -> Self {
        Self { api, store, config }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub async fn ingest_channel(&self, channel_id: &str) -> Result<IngestionSummary, IngestionError> {
        self.ingest_channel_with_cancel(channel_id, &CancellationToken::new())
            .await
    }

    /// Like [`ingest_channel`](Self::ingest_channel), checking `cancel`
    /// before each video. A cancelled run still returns its partial summary.
    pub async fn ingest_channel_with_cancel(
        &self,
        channel_id: &str,
        cancel: &CancellationToken,
    ) -> Result<IngestionSummary, IngestionError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("ingest", %run_id, channel_id = %channel_id);

        self.run(run_id, channel_id, cancel).instrument(span).await
    }

    async fn run(
        &self,
        run_id: Uuid,
        channel_id: &str,
        cancel: &CancellationToken,
    ) -> Result<IngestionSummary, IngestionError> {
        info!("Starting channel ingestion");
        let mut summary = IngestionSummary::start(run_id, channel_id);

        // 1. Channel
        let page = fetch_page(
            self.api.as_ref(),
            &ListRequest::channel(channel_id),
            self.config.page_timeout(),
            0,
        )
        .await
        .map_err(|source| IngestionError::Fetch {
            channel_id: channel_id.to_string(),
            source,
        })?;

        let item = page
            .items
            .first()
            .ok_or_else(|| IngestionError::ChannelNotFound(channel_id.to_string()))?;

        let mut channel = mapper::map_channel(item).map_err(|source| IngestionError::Mapping {
            channel_id: channel_id.to_string(),
            source,
        })?;
        if channel.channel_id.is_empty() {
            channel.channel_id = channel_id.to_string();
        }

        let channel_key =
            self.store
                .upsert_channel(&channel)
                .await
                .map_err(|source| IngestionError::Write {
                    channel_id: channel_id.to_string(),
                    source,
                })?;
        summary.channels_written += 1;
        info!(
            name = %channel.name,
            subscribers = channel.subscribers,
            "Stored channel"
        );

        if !channel.has_uploads() {
            info!("Channel has no uploads playlist, nothing more to ingest");
            return Ok(summary.finish());
        }

        // 2. Video ids
        let video_ids = self
            .collect_video_ids(&channel.playlist_id, &mut summary)
            .await;
        info!(videos = video_ids.len(), "Enumerated uploads playlist");

        // 3. Videos and their comments
        for video_id in &video_ids {
            if cancel.is_cancelled() {
                warn!("Ingestion cancelled before video {}", video_id);
                summary.cancelled = true;
                break;
            }
            self.ingest_video(channel_key, video_id, &mut summary).await;
        }

        let summary = summary.finish();
        info!(
            videos_written = summary.videos_written,
            comments_written = summary.comments_written,
            warnings = summary.warnings.len(),
            cancelled = summary.cancelled,
            "Channel ingestion finished"
        );
        Ok(summary)
    }

    /// Ordered, de-duplicated video ids of the uploads playlist
    async fn collect_video_ids(
        &self,
        playlist_id: &str,
        summary: &mut IngestionSummary,
    ) -> Vec<String> {
        let cursor = PageCursor::new(
            self.api.as_ref(),
            ListRequest::playlist_items(playlist_id, self.config.playlist_page_size),
            self.config.page_timeout(),
        );

        let mut seen = HashSet::new();
        let mut video_ids = Vec::new();
        let mut pages = cursor.fetch_all();

        while let Some(batch) = pages.next().await {
            let items = match batch {
                Ok(items) => items,
                Err(failure) => {
                    summary.warn(IngestionWarning::PlaylistFetchFailed {
                        playlist_id: playlist_id.to_string(),
                        page_index: failure.page_index,
                        reason: failure.to_string(),
                    });
                    break;
                },
            };

            for item in &items {
                match mapper::map_playlist_video_id(item) {
                    Ok(Some(video_id)) => {
                        if seen.insert(video_id.clone()) {
                            video_ids.push(video_id);
                        }
                    },
                    Ok(None) => debug!("Playlist item without a video id"),
                    Err(e) => summary.warn(IngestionWarning::MalformedPayload {
                        entity: e.entity.to_string(),
                        video_id: None,
                        reason: e.reason,
                    }),
                }
            }
        }

        video_ids
    }

    async fn ingest_video(
        &self,
        channel_key: ChannelKey,
        video_id: &str,
        summary: &mut IngestionSummary,
    ) {
        let page = match fetch_page(
            self.api.as_ref(),
            &ListRequest::video(video_id),
            self.config.page_timeout(),
            0,
        )
        .await
        {
            Ok(page) => page,
            Err(failure) => {
                summary.warn(IngestionWarning::VideoFetchFailed {
                    video_id: video_id.to_string(),
                    reason: failure.to_string(),
                });
                return;
            },
        };

        let Some(item) = page.items.first() else {
            summary.warn(IngestionWarning::VideoMissing {
                video_id: video_id.to_string(),
            });
            return;
        };

        let mut video = match mapper::map_video(item) {
            Ok(video) => video,
            Err(e) => {
                summary.warn(IngestionWarning::MalformedPayload {
                    entity: e.entity.to_string(),
                    video_id: Some(video_id.to_string()),
                    reason: e.reason,
                });
                return;
            },
        };
        if video.video_id.is_empty() {
            video.video_id = video_id.to_string();
        }

        let video_key = match self.store.upsert_video(channel_key, &video).await {
            Ok(key) => key,
            Err(e) => {
                summary.warn(IngestionWarning::VideoWriteFailed {
                    video_id: video_id.to_string(),
                    reason: e.to_string(),
                });
                return;
            },
        };
        summary.videos_written += 1;
        debug!(video_id, title = %video.name, "Stored video");

        self.ingest_comments(video_key, video_id, summary).await;
    }

    async fn ingest_comments(
        &self,
        video_key: VideoKey,
        video_id: &str,
        summary: &mut IngestionSummary,
    ) {
        let cursor = PageCursor::new(
            self.api.as_ref(),
            ListRequest::comment_threads(video_id, self.config.comment_page_size),
            self.config.page_timeout(),
        );
        let mut pages = cursor.fetch_all();
        let mut written = 0u64;

        while let Some(batch) = pages.next().await {
            let items = match batch {
                Ok(items) => items,
                Err(failure) => {
                    summary.warn(IngestionWarning::CommentFetchFailed {
                        video_id: video_id.to_string(),
                        page_index: failure.page_index,
                        reason: failure.to_string(),
                    });
                    break;
                },
            };

            for item in &items {
                let comment = match mapper::map_comment(item) {
                    Ok(comment) => comment,
                    Err(e) => {
                        summary.warn(IngestionWarning::MalformedPayload {
                            entity: e.entity.to_string(),
                            video_id: Some(video_id.to_string()),
                            reason: e.reason,
                        });
                        continue;
                    },
                };

                match self.store.upsert_comment(video_key, &comment).await {
                    Ok(_) => written += 1,
                    Err(e) => summary.warn(IngestionWarning::CommentWriteFailed {
                        video_id: video_id.to_string(),
                        comment_id: comment.comment_id.clone(),
                        reason: e.to_string(),
                    }),
                }
            }
        }

        summary.comments_written += written;
        debug!(video_id, comments = written, "Stored comments");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::client::ResourceKind;
    use crate::error::StoreError;
    use crate::models::{ChannelRecord, CommentKey, CommentRecord, VideoRecord};
    use crate::repository::Repository;
    use crate::test_support::{
        channel_json, comment_json, playlist_item_json, video_json, FakeApi, FakePage,
    };
    use async_trait::async_trait;
    use serde_json::json;

    async fn create_test_repository() -> Arc<Repository> {
        let repo = Repository::in_memory().await.unwrap();
        repo.ensure_schema().await.unwrap();
        Arc::new(repo)
    }

    fn pipeline(api: FakeApi, store: Arc<dyn EntityStore>) -> (IngestionPipeline, Arc<FakeApi>) {
        let api = Arc::new(api);
        let pipeline = IngestionPipeline::new(api.clone(), store, HarvestConfig::default());
        (pipeline, api)
    }

    /// UC_X with uploads A and B; A has three comments, B was deleted
    fn uc_x_api(subscribers: u64) -> FakeApi {
        FakeApi::new()
            .with_items(
                ResourceKind::Channels,
                "UC_X",
                vec![channel_json("UC_X", "Rust Talks", subscribers, "UU_X")],
            )
            .with_items(
                ResourceKind::PlaylistItems,
                "UU_X",
                vec![playlist_item_json("vid_A"), playlist_item_json("vid_B")],
            )
            .with_items(ResourceKind::Videos, "vid_A", vec![video_json("vid_A", "Ownership")])
            .with_items(ResourceKind::Videos, "vid_B", vec![])
            .with_pages(
                ResourceKind::CommentThreads,
                "vid_A",
                vec![
                    FakePage::Items(vec![comment_json("c1", "first"), comment_json("c2", "second")]),
                    FakePage::Items(vec![comment_json("c3", "third")]),
                ],
            )
    }

    /// Delegates to a repository but refuses the listed natural keys
    struct FlakyStore {
        inner: Arc<Repository>,
        reject: Vec<&'static str>,
    }

    #[async_trait]
    impl EntityStore for FlakyStore {
        async fn upsert_channel(&self, record: &ChannelRecord) -> Result<ChannelKey, StoreError> {
            if self.reject.contains(&record.channel_id.as_str()) {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }
            self.inner.upsert_channel(record).await
        }

        async fn upsert_video(
            &self,
            channel: ChannelKey,
            record: &VideoRecord,
        ) -> Result<VideoKey, StoreError> {
            if self.reject.contains(&record.video_id.as_str()) {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }
            self.inner.upsert_video(channel, record).await
        }

        async fn upsert_comment(
            &self,
            video: VideoKey,
            record: &CommentRecord,
        ) -> Result<CommentKey, StoreError> {
            if self.reject.contains(&record.comment_id.as_str()) {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }
            self.inner.upsert_comment(video, record).await
        }
    }

    #[tokio::test]
    async fn test_deleted_video_is_a_warning_not_an_error() {
        let repo = create_test_repository().await;
        let (pipeline, _) = pipeline(uc_x_api(100), repo.clone());

        let summary = pipeline.ingest_channel("UC_X").await.unwrap();

        assert_eq!(summary.channels_written, 1);
        assert_eq!(summary.videos_written, 1);
        assert_eq!(summary.comments_written, 3);
        assert_eq!(
            summary.warnings,
            vec![IngestionWarning::VideoMissing {
                video_id: "vid_B".to_string()
            }]
        );
        assert!(!summary.cancelled);
        assert!(summary.finished_at >= summary.started_at);

        let counts = repo.counts().await.unwrap();
        assert_eq!((counts.channels, counts.videos, counts.comments), (1, 1, 3));
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent_and_updates_in_place() {
        let repo = create_test_repository().await;
        let (first, _) = pipeline(uc_x_api(100), repo.clone());
        first.ingest_channel("UC_X").await.unwrap();
        let before = repo.counts().await.unwrap();

        let (second, _) = pipeline(uc_x_api(250), repo.clone());
        let summary = second.ingest_channel("UC_X").await.unwrap();

        assert_eq!(summary.videos_written, 1);
        assert_eq!(repo.counts().await.unwrap(), before);

        let subscribers: i64 = sqlx::query_scalar("SELECT subscribers FROM channels WHERE channel_id = 'UC_X'")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(subscribers, 250);
    }

    #[tokio::test]
    async fn test_every_row_references_its_parent() {
        let repo = create_test_repository().await;
        let (pipeline, _) = pipeline(uc_x_api(1), repo.clone());
        pipeline.ingest_channel("UC_X").await.unwrap();

        let orphans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments cm LEFT JOIN videos v ON v.id = cm.video_id \
             LEFT JOIN channels c ON c.id = v.channel_id WHERE c.channel_id IS NOT 'UC_X'",
        )
        .fetch_one(repo.pool())
        .await
        .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_unknown_channel_is_fatal() {
        let repo = create_test_repository().await;
        let (pipeline, api) = pipeline(FakeApi::new(), repo.clone());

        let err = pipeline.ingest_channel("UC_NOPE").await.unwrap_err();

        assert!(matches!(err, IngestionError::ChannelNotFound(ref id) if id == "UC_NOPE"));
        assert!(!err.is_retryable());
        assert_eq!(api.call_count(), 1);
        assert_eq!(repo.counts().await.unwrap().channels, 0);
    }

    #[tokio::test]
    async fn test_channel_fetch_failure_is_fatal() {
        let repo = create_test_repository().await;
        let api = FakeApi::new().with_pages(ResourceKind::Channels, "UC_X", vec![FakePage::Error(503)]);
        let (pipeline, _) = pipeline(api, repo);

        let err = pipeline.ingest_channel("UC_X").await.unwrap_err();

        assert!(matches!(err, IngestionError::Fetch { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_channel_write_failure_is_fatal() {
        let repo = create_test_repository().await;
        let store = Arc::new(FlakyStore {
            inner: repo,
            reject: vec!["UC_X"],
        });
        let (pipeline, api) = pipeline(uc_x_api(1), store);

        let err = pipeline.ingest_channel("UC_X").await.unwrap_err();

        assert!(matches!(err, IngestionError::Write { .. }));
        assert_eq!(api.calls_for(ResourceKind::PlaylistItems), 0);
    }

    #[tokio::test]
    async fn test_channel_without_uploads_succeeds_empty() {
        let repo = create_test_repository().await;
        let api = FakeApi::new().with_items(
            ResourceKind::Channels,
            "UC_QUIET",
            vec![json!({ "id": "UC_QUIET", "snippet": { "title": "Quiet" } })],
        );
        let (pipeline, api) = pipeline(api, repo.clone());

        let summary = pipeline.ingest_channel("UC_QUIET").await.unwrap();

        assert_eq!(summary.channels_written, 1);
        assert_eq!(summary.videos_written, 0);
        assert!(!summary.has_warnings());
        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_channel_id_falls_back_to_requested_id() {
        let repo = create_test_repository().await;
        let api = FakeApi::new().with_items(
            ResourceKind::Channels,
            "UC_ANON",
            vec![json!({ "snippet": { "title": "No id in payload" } })],
        );
        let (pipeline, _) = pipeline(api, repo.clone());

        pipeline.ingest_channel("UC_ANON").await.unwrap();

        let results = repo
            .execute_read_query("SELECT channel_id FROM channels")
            .await
            .unwrap();
        assert_eq!(results.rows, vec![vec![json!("UC_ANON")]]);
    }

    #[tokio::test]
    async fn test_comment_page_failure_only_stops_that_video() {
        let repo = create_test_repository().await;
        let api = FakeApi::new()
            .with_items(
                ResourceKind::Channels,
                "UC_X",
                vec![channel_json("UC_X", "Rust Talks", 1, "UU_X")],
            )
            .with_items(
                ResourceKind::PlaylistItems,
                "UU_X",
                vec![playlist_item_json("vid_A"), playlist_item_json("vid_C")],
            )
            .with_items(ResourceKind::Videos, "vid_A", vec![video_json("vid_A", "A")])
            .with_items(ResourceKind::Videos, "vid_C", vec![video_json("vid_C", "C")])
            .with_pages(
                ResourceKind::CommentThreads,
                "vid_A",
                vec![
                    FakePage::Items(vec![comment_json("a1", "kept")]),
                    FakePage::Error(403),
                ],
            )
            .with_items(
                ResourceKind::CommentThreads,
                "vid_C",
                vec![comment_json("c1", "one"), comment_json("c2", "two")],
            );
        let (pipeline, _) = pipeline(api, repo);

        let summary = pipeline.ingest_channel("UC_X").await.unwrap();

        assert_eq!(summary.videos_written, 2);
        assert_eq!(summary.comments_written, 3);
        assert_eq!(summary.warnings.len(), 1);
        assert!(matches!(
            &summary.warnings[0],
            IngestionWarning::CommentFetchFailed { video_id, page_index: 1, .. } if video_id == "vid_A"
        ));
    }

    #[tokio::test]
    async fn test_write_failures_are_isolated() {
        let repo = create_test_repository().await;
        let api = uc_x_api(1)
            .with_items(
                ResourceKind::PlaylistItems,
                "UU_X",
                vec![playlist_item_json("vid_A"), playlist_item_json("vid_D")],
            )
            .with_items(ResourceKind::Videos, "vid_D", vec![video_json("vid_D", "D")])
            .with_items(ResourceKind::CommentThreads, "vid_D", vec![comment_json("d1", "never")]);
        let store = Arc::new(FlakyStore {
            inner: repo.clone(),
            reject: vec!["vid_D", "c2"],
        });
        let (pipeline, api) = pipeline(api, store);

        let summary = pipeline.ingest_channel("UC_X").await.unwrap();

        assert_eq!(summary.videos_written, 1);
        assert_eq!(summary.comments_written, 2);
        assert_eq!(summary.warnings.len(), 2);
        assert!(matches!(
            &summary.warnings[0],
            IngestionWarning::CommentWriteFailed { comment_id, .. } if comment_id == "c2"
        ));
        assert!(matches!(
            &summary.warnings[1],
            IngestionWarning::VideoWriteFailed { video_id, .. } if video_id == "vid_D"
        ));
        // comments of an unstored video are never requested
        let comment_requests: Vec<_> = api
            .requests()
            .into_iter()
            .filter(|r| r.resource == ResourceKind::CommentThreads)
            .map(|r| r.filter.value().to_string())
            .collect();
        assert!(!comment_requests.contains(&"vid_D".to_string()));
    }

    #[tokio::test]
    async fn test_playlist_failure_keeps_ids_found_so_far() {
        let repo = create_test_repository().await;
        let api = uc_x_api(1).with_pages(
            ResourceKind::PlaylistItems,
            "UU_X",
            vec![
                FakePage::Items(vec![playlist_item_json("vid_A")]),
                FakePage::Error(500),
            ],
        );
        let (pipeline, _) = pipeline(api, repo);

        let summary = pipeline.ingest_channel("UC_X").await.unwrap();

        assert_eq!(summary.videos_written, 1);
        assert_eq!(summary.comments_written, 3);
        assert!(matches!(
            &summary.warnings[0],
            IngestionWarning::PlaylistFetchFailed { page_index: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_duplicate_playlist_entries_are_fetched_once() {
        let repo = create_test_repository().await;
        let api = uc_x_api(1).with_items(
            ResourceKind::PlaylistItems,
            "UU_X",
            vec![
                playlist_item_json("vid_A"),
                json!("not an object"),
                playlist_item_json("vid_A"),
            ],
        );
        let (pipeline, api) = pipeline(api, repo);

        let summary = pipeline.ingest_channel("UC_X").await.unwrap();

        assert_eq!(api.calls_for(ResourceKind::Videos), 1);
        assert_eq!(summary.videos_written, 1);
        assert!(matches!(
            &summary.warnings[0],
            IngestionWarning::MalformedPayload { video_id: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_partial_summary() {
        let repo = create_test_repository().await;
        let (pipeline, api) = pipeline(uc_x_api(1), repo.clone());
        let token = CancellationToken::new();
        token.cancel();

        let summary = pipeline
            .ingest_channel_with_cancel("UC_X", &token)
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.channels_written, 1);
        assert_eq!(summary.videos_written, 0);
        assert_eq!(api.calls_for(ResourceKind::Videos), 0);
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_the_store() {
        let repo = create_test_repository().await;
        let api = uc_x_api(1)
            .with_items(
                ResourceKind::Channels,
                "UC_Y",
                vec![channel_json("UC_Y", "Other", 2, "UU_Y")],
            )
            .with_items(ResourceKind::PlaylistItems, "UU_Y", vec![playlist_item_json("vid_A")]);
        let (pipeline, _) = pipeline(api, repo.clone());

        let (x, y) = tokio::join!(pipeline.ingest_channel("UC_X"), pipeline.ingest_channel("UC_Y"));
        x.unwrap();
        y.unwrap();

        let counts = repo.counts().await.unwrap();
        assert_eq!(counts.channels, 2);
        assert_eq!(counts.videos, 1);
        assert_eq!(counts.comments, 3);
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = IngestionWarning::VideoMissing {
            video_id: "vid_B".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&warning).unwrap(),
            json!({ "kind": "video_missing", "video_id": "vid_B" })
        );
        assert_eq!(warning.to_string(), "video vid_B no longer exists");
        assert_eq!(warning.video_id(), Some("vid_B"));
    }
}
