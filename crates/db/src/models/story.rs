//! Generated story entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storymill_core::types::Timestamp;

use super::character::Character;

/// A row from the `stories` table — the central entity of the pipeline.
///
/// Creation fields (`id` through `expires_at`) are write-once. The two URL
/// fields are each owned by exactly one enrichment worker: `audio_url` by
/// the audio worker, `thumbnail_url` by the image worker. No other
/// component writes them, which is what makes lock-free concurrent
/// enrichment safe.
///
/// The serde renames produce the fixed wire shape used in change-log
/// images: `{id, title, description, characters, scene, createdAt,
/// ttl, audioURL?, thumbnailURL?}` with `ttl` in epoch seconds.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Snapshots of the characters the story was generated from (JSONB).
    #[sqlx(json)]
    pub characters: Vec<Character>,
    /// Description of the scene the story is set in.
    pub scene: String,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    /// Advisory expiry; the sweeper deletes rows past this time.
    #[serde(rename = "ttl", with = "chrono::serde::ts_seconds")]
    pub expires_at: Timestamp,
    /// Set exactly once by the audio worker.
    #[serde(
        rename = "audioURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub audio_url: Option<String>,
    /// Set exactly once by the image worker.
    #[serde(
        rename = "thumbnailURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail_url: Option<String>,
}

/// The two enrichment fields a worker may patch.
///
/// Field-level write ownership is the pipeline's concurrency-control
/// mechanism: the audio worker only ever patches [`StoryField::AudioUrl`]
/// and the image worker only [`StoryField::ThumbnailUrl`], so concurrent
/// enrichment of the same story cannot clobber the sibling's write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryField {
    AudioUrl,
    ThumbnailUrl,
}

impl StoryField {
    /// The `stories` column this field maps to.
    pub fn column(&self) -> &'static str {
        match self {
            StoryField::AudioUrl => "audio_url",
            StoryField::ThumbnailUrl => "thumbnail_url",
        }
    }
}

impl Story {
    /// Build a new story with a freshly generated id, stamped `created_at`,
    /// and no enrichment fields.
    pub fn new(
        title: String,
        description: String,
        characters: Vec<Character>,
        scene: String,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id: storymill_core::types::new_story_id(),
            title,
            description,
            characters,
            scene,
            created_at: chrono::Utc::now(),
            expires_at,
            audio_url: None,
            thumbnail_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_story() -> Story {
        Story::new(
            "The Quiet Forest".to_string(),
            "Once upon a time...".to_string(),
            vec![Character {
                id: "c1".to_string(),
                name: "Ana".to_string(),
                description: None,
            }],
            "a quiet forest".to_string(),
            chrono::Utc::now() + chrono::Duration::days(2),
        )
    }

    #[test]
    fn new_story_has_no_enrichment_fields() {
        let story = sample_story();
        assert!(story.audio_url.is_none());
        assert!(story.thumbnail_url.is_none());
        assert!(!story.id.is_empty());
    }

    #[test]
    fn wire_shape_uses_fixed_field_names() {
        let story = sample_story();
        let value = serde_json::to_value(&story).unwrap();

        assert!(value.get("createdAt").is_some());
        assert!(value.get("ttl").is_some());
        assert!(value["ttl"].is_i64(), "ttl must be epoch seconds");
        // Absent enrichment fields are omitted, not null.
        assert!(value.get("audioURL").is_none());
        assert!(value.get("thumbnailURL").is_none());
    }

    #[test]
    fn wire_shape_round_trips() {
        let mut story = sample_story();
        story.audio_url = Some("https://example.com/audio.mp3".to_string());

        let value = serde_json::to_value(&story).unwrap();
        assert_eq!(value["audioURL"], "https://example.com/audio.mp3");

        let back: Story = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, story.id);
        assert_eq!(back.audio_url, story.audio_url);
        assert_eq!(back.characters, story.characters);
        // `ttl` is epoch seconds, so sub-second precision is dropped.
        assert_eq!(back.expires_at.timestamp(), story.expires_at.timestamp());
    }
}
