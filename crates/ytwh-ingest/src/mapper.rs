//! Payload → record mapping
//!
//! Pure functions: no I/O, no logging. The only failure is an item that is not
//! a JSON object; every missing field takes the default documented in
//! [`crate::payload`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::MappingError;
use crate::models::{ChannelRecord, CommentRecord, VideoRecord};
use crate::payload::{ChannelPayload, CommentThreadPayload, PlaylistItemPayload, VideoPayload};

fn decode<T: DeserializeOwned>(entity: &'static str, item: &Value) -> Result<T, MappingError> {
    if !item.is_object() {
        return Err(MappingError::new(
            entity,
            format!("expected a JSON object, got {}", json_kind(item)),
        ));
    }
    T::deserialize(item).map_err(|e| MappingError::new(entity, e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Map a `channels.list` item
pub fn map_channel(item: &Value) -> Result<ChannelRecord, MappingError> {
    let payload: ChannelPayload = decode("channel", item)?;

    Ok(ChannelRecord {
        channel_id: payload.id,
        name: payload.snippet.title,
        description: payload.snippet.description,
        subscribers: payload.statistics.subscriber_count,
        views: payload.statistics.view_count,
        playlist_id: payload.content_details.related_playlists.uploads,
    })
}

/// Extract the video id from a `playlistItems.list` item.
///
/// Returns `None` for items that reference no video (e.g. removed entries).
pub fn map_playlist_video_id(item: &Value) -> Result<Option<String>, MappingError> {
    let payload: PlaylistItemPayload = decode("playlist item", item)?;

    let video_id = if payload.content_details.video_id.is_empty() {
        payload.snippet.resource_id.video_id
    } else {
        payload.content_details.video_id
    };

    Ok(Some(video_id).filter(|id| !id.is_empty()))
}

/// Map a `videos.list` item
pub fn map_video(item: &Value) -> Result<VideoRecord, MappingError> {
    let payload: VideoPayload = decode("video", item)?;
    let thumbnail = payload.snippet.thumbnails.best_url().to_string();

    Ok(VideoRecord {
        video_id: payload.id,
        name: payload.snippet.title,
        description: payload.snippet.description,
        tags: payload.snippet.tags,
        published_at: payload.snippet.published_at,
        view_count: payload.statistics.view_count,
        like_count: payload.statistics.like_count,
        dislike_count: payload.statistics.dislike_count,
        favorite_count: payload.statistics.favorite_count,
        comment_count: payload.statistics.comment_count,
        duration: payload.content_details.duration,
        thumbnail,
        caption_status: payload.content_details.caption,
    })
}

/// Map a `commentThreads.list` item to its top-level comment
pub fn map_comment(item: &Value) -> Result<CommentRecord, MappingError> {
    let payload: CommentThreadPayload = decode("comment thread", item)?;
    let snippet = payload.snippet.top_level_comment.snippet;

    Ok(CommentRecord {
        comment_id: payload.id,
        text: snippet.text_original,
        author: snippet.author_display_name,
        published_at: snippet.published_at,
    })
}
