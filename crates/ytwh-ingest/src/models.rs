//! Normalized records written to the warehouse

use serde::{Deserialize, Serialize};

/// Surrogate key of a row in `channels`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct ChannelKey(pub i64);

/// Surrogate key of a row in `videos`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct VideoKey(pub i64);

/// Surrogate key of a row in `comments`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct CommentKey(pub i64);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub name: String,
    pub description: String,
    pub subscribers: u64,
    pub views: u64,
    /// Uploads playlist; empty when the channel exposes none
    pub playlist_id: String,
}

impl ChannelRecord {
    pub fn has_uploads(&self) -> bool {
        !self.playlist_id.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub published_at: String,
    pub view_count: u64,
    pub like_count: u64,
    pub dislike_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
    /// ISO 8601 duration as sent by the API, e.g. `PT4M13S`
    pub duration: String,
    pub thumbnail: String,
    pub caption_status: String,
}

impl VideoRecord {
    /// Column representation of `tags`: a JSON array, `[]` when empty
    pub fn tags_column(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.tags)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment_id: String,
    pub text: String,
    pub author: String,
    pub published_at: String,
}
