//! Typed view of the raw API payloads
//!
//! Every field the mapper reads is declared here with a default, so a missing,
//! `null` or oddly typed field never fails decoding:
//!
//! | Field kind | Default |
//! |---|---|
//! | counts (decimal strings or numbers) | `0`, also for unparseable text |
//! | strings | `""` |
//! | string lists | `[]`, non-string entries dropped |
//! | nested objects | all fields defaulted |

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// The API encodes 64-bit counters as decimal strings
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Nested objects: absent, `null` or a non-object all decode to the default
fn lenient_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    })
}

// ============================================================================
// channels.list
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_object")]
    pub snippet: ChannelSnippet,
    #[serde(deserialize_with = "lenient_object")]
    pub statistics: ChannelStatistics,
    #[serde(deserialize_with = "lenient_object")]
    pub content_details: ChannelContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelSnippet {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelStatistics {
    #[serde(deserialize_with = "lenient_count")]
    pub subscriber_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub view_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelContentDetails {
    #[serde(deserialize_with = "lenient_object")]
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RelatedPlaylists {
    #[serde(deserialize_with = "lenient_string")]
    pub uploads: String,
}

// ============================================================================
// playlistItems.list
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaylistItemPayload {
    #[serde(deserialize_with = "lenient_object")]
    pub snippet: PlaylistItemSnippet,
    #[serde(deserialize_with = "lenient_object")]
    pub content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaylistItemSnippet {
    #[serde(deserialize_with = "lenient_object")]
    pub resource_id: ResourceId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceId {
    #[serde(deserialize_with = "lenient_string")]
    pub video_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaylistItemContentDetails {
    #[serde(deserialize_with = "lenient_string")]
    pub video_id: String,
}

// ============================================================================
// videos.list
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_object")]
    pub snippet: VideoSnippet,
    #[serde(deserialize_with = "lenient_object")]
    pub statistics: VideoStatistics,
    #[serde(deserialize_with = "lenient_object")]
    pub content_details: VideoContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSnippet {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub published_at: String,
    #[serde(deserialize_with = "lenient_object")]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Thumbnails {
    #[serde(deserialize_with = "lenient_object")]
    pub default: Thumbnail,
    #[serde(deserialize_with = "lenient_object")]
    pub medium: Thumbnail,
    #[serde(deserialize_with = "lenient_object")]
    pub high: Thumbnail,
}

impl Thumbnails {
    /// Largest of the three standard renditions that has a URL
    pub fn best_url(&self) -> &str {
        [&self.high, &self.medium, &self.default]
            .into_iter()
            .map(|t| t.url.as_str())
            .find(|url| !url.is_empty())
            .unwrap_or("")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoStatistics {
    #[serde(deserialize_with = "lenient_count")]
    pub view_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub like_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub dislike_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub favorite_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub comment_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoContentDetails {
    #[serde(deserialize_with = "lenient_string")]
    pub duration: String,
    /// `"true"` / `"false"` in the API; kept verbatim
    #[serde(deserialize_with = "lenient_string")]
    pub caption: String,
}

// ============================================================================
// commentThreads.list
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentThreadPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_object")]
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentThreadSnippet {
    #[serde(deserialize_with = "lenient_object")]
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopLevelComment {
    #[serde(deserialize_with = "lenient_object")]
    pub snippet: CommentSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentSnippet {
    #[serde(deserialize_with = "lenient_string")]
    pub text_original: String,
    #[serde(deserialize_with = "lenient_string")]
    pub author_display_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub published_at: String,
}
