//! Relational store for harvested entities
//!
//! Backed by SQLite through `sqlx`. Every write is a single
//! `INSERT … ON CONFLICT(natural key) DO UPDATE … RETURNING id` statement, so
//! an upsert is atomic, idempotent by natural key, and concurrent upserts of
//! the same key serialize inside the database (last write wins).

use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{QueryError, StoreError};
use crate::models::{
    ChannelKey, ChannelRecord, CommentKey, CommentRecord, VideoKey, VideoRecord,
};
use crate::query::{self, QueryResults};

// ============================================================================
// Repository Constants
// ============================================================================

/// Database used when neither `--database-url` nor `DATABASE_URL` is given
pub const DEFAULT_DATABASE_URL: &str = "sqlite:ytwh.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_CONNECTIONS: u32 = 5;

/// Write side of the warehouse, as seen by the ingestion pipeline
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn upsert_channel(&self, record: &ChannelRecord) -> Result<ChannelKey, StoreError>;

    async fn upsert_video(
        &self,
        channel: ChannelKey,
        record: &VideoRecord,
    ) -> Result<VideoKey, StoreError>;

    async fn upsert_comment(
        &self,
        video: VideoKey,
        record: &CommentRecord,
    ) -> Result<CommentKey, StoreError>;
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub channels: i64,
    pub videos: i64,
    pub comments: i64,
}

#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Open (creating if needed) the database behind `database_url`.
    ///
    /// In-memory databases live on a single pinned connection; each extra
    /// connection would otherwise see its own empty database.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
        };

        let pool = pool_options.connect_with(options).await?;
        info!(database_url = %database_url, "Connected to warehouse database");

        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create missing tables. Safe to call on every start; never drops data.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Warehouse schema is up to date");
        Ok(())
    }

    pub async fn counts(&self) -> Result<TableCounts, StoreError> {
        let channels = sqlx::query_scalar("SELECT COUNT(*) FROM channels")
            .fetch_one(&self.pool)
            .await?;
        let videos = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(&self.pool)
            .await?;
        let comments = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await?;

        Ok(TableCounts {
            channels,
            videos,
            comments,
        })
    }

    /// Run an operator-supplied read-only query
    pub async fn execute_read_query(&self, sql: &str) -> Result<QueryResults, QueryError> {
        query::run_read_query(&self.pool, sql, query::DEFAULT_QUERY_TIMEOUT).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn require_key(entity: &'static str, key: &str) -> Result<(), StoreError> {
    if key.trim().is_empty() {
        return Err(StoreError::MissingNaturalKey { entity });
    }
    Ok(())
}

/// SQLite integers are signed; counts beyond `i64::MAX` saturate
fn db_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[async_trait]
impl EntityStore for Repository {
    async fn upsert_channel(&self, record: &ChannelRecord) -> Result<ChannelKey, StoreError> {
        require_key("channel", &record.channel_id)?;

        let key = sqlx::query_scalar::<_, ChannelKey>(
            r#"
            INSERT INTO channels (channel_id, name, description, subscribers, views, playlist_id, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
            ON CONFLICT(channel_id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                subscribers = excluded.subscribers,
                views = excluded.views,
                playlist_id = excluded.playlist_id,
                updated_at = datetime('now')
            RETURNING id
            "#,
        )
        .bind(&record.channel_id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(db_count(record.subscribers))
        .bind(db_count(record.views))
        .bind(&record.playlist_id)
        .fetch_one(&self.pool)
        .await?;

        debug!(channel_id = %record.channel_id, key = key.0, "Upserted channel");
        Ok(key)
    }

    async fn upsert_video(
        &self,
        channel: ChannelKey,
        record: &VideoRecord,
    ) -> Result<VideoKey, StoreError> {
        require_key("video", &record.video_id)?;
        let tags = record.tags_column()?;

        let key = sqlx::query_scalar::<_, VideoKey>(
            r#"
            INSERT INTO videos (
                video_id, channel_id, name, description, tags, published_at,
                view_count, like_count, dislike_count, favorite_count, comment_count,
                duration, thumbnail, caption_status, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, datetime('now'))
            ON CONFLICT(video_id) DO UPDATE SET
                channel_id = excluded.channel_id,
                name = excluded.name,
                description = excluded.description,
                tags = excluded.tags,
                published_at = excluded.published_at,
                view_count = excluded.view_count,
                like_count = excluded.like_count,
                dislike_count = excluded.dislike_count,
                favorite_count = excluded.favorite_count,
                comment_count = excluded.comment_count,
                duration = excluded.duration,
                thumbnail = excluded.thumbnail,
                caption_status = excluded.caption_status,
                updated_at = datetime('now')
            RETURNING id
            "#,
        )
        .bind(&record.video_id)
        .bind(channel)
        .bind(&record.name)
        .bind(&record.description)
        .bind(tags)
        .bind(&record.published_at)
        .bind(db_count(record.view_count))
        .bind(db_count(record.like_count))
        .bind(db_count(record.dislike_count))
        .bind(db_count(record.favorite_count))
        .bind(db_count(record.comment_count))
        .bind(&record.duration)
        .bind(&record.thumbnail)
        .bind(&record.caption_status)
        .fetch_one(&self.pool)
        .await?;

        debug!(video_id = %record.video_id, key = key.0, "Upserted video");
        Ok(key)
    }

    async fn upsert_comment(
        &self,
        video: VideoKey,
        record: &CommentRecord,
    ) -> Result<CommentKey, StoreError> {
        require_key("comment", &record.comment_id)?;

        let key = sqlx::query_scalar::<_, CommentKey>(
            r#"
            INSERT INTO comments (comment_id, video_id, text, author, published_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
            ON CONFLICT(comment_id) DO UPDATE SET
                video_id = excluded.video_id,
                text = excluded.text,
                author = excluded.author,
                published_at = excluded.published_at,
                updated_at = datetime('now')
            RETURNING id
            "#,
        )
        .bind(&record.comment_id)
        .bind(video)
        .bind(&record.text)
        .bind(&record.author)
        .bind(&record.published_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(key)
    }
}
