//! The `StoryGenerated` domain event and its routing envelope.

use serde::{Deserialize, Serialize};
use storymill_core::types::Timestamp;
use validator::Validate;

/// Envelope `source` for every event this pipeline publishes.
pub const EVENT_SOURCE: &str = "ai.stories";

/// Envelope `detailType` for the story-creation event.
pub const STORY_GENERATED: &str = "StoryGenerated";

/// The canonical domain event: a new story exists.
///
/// Derived from the insert's change-log image, never persisted, and may be
/// delivered more than once for the same `id` — consumers must be
/// idempotent. Field values are copied verbatim from the new image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StoryGenerated {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub title: String,
    /// May legitimately be empty for a single-line story.
    pub description: String,
    #[validate(length(min = 1))]
    pub scene: String,
}

/// Routing envelope published on the bus.
///
/// Wire shape: `{source: "ai.stories", detailType: "StoryGenerated",
/// detail: {...}}`. `detail` stays untyped JSON here; the subscriber runner
/// deserializes it back into [`StoryGenerated`] before invoking a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub source: String,
    #[serde(rename = "detailType")]
    pub detail_type: String,
    pub detail: serde_json::Value,
    #[serde(rename = "publishedAt")]
    pub published_at: Timestamp,
}

impl EventEnvelope {
    /// Wrap a [`StoryGenerated`] event for publication.
    pub fn story_generated(event: &StoryGenerated) -> Self {
        Self {
            source: EVENT_SOURCE.to_string(),
            detail_type: STORY_GENERATED.to_string(),
            detail: serde_json::to_value(event).expect("StoryGenerated serializes"),
            published_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> StoryGenerated {
        StoryGenerated {
            id: "abc-123".to_string(),
            title: "The Quiet Forest".to_string(),
            description: "Once upon a time...".to_string(),
            scene: "a quiet forest".to_string(),
        }
    }

    #[test]
    fn envelope_carries_fixed_source_and_detail_type() {
        let envelope = EventEnvelope::story_generated(&sample_event());
        assert_eq!(envelope.source, "ai.stories");
        assert_eq!(envelope.detail_type, "StoryGenerated");
        assert_eq!(envelope.detail["id"], "abc-123");
    }

    #[test]
    fn envelope_wire_shape() {
        let envelope = EventEnvelope::story_generated(&sample_event());
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("detailType").is_some());
        assert_eq!(value["detail"]["scene"], "a quiet forest");
    }

    #[test]
    fn validation_rejects_empty_required_fields() {
        let mut event = sample_event();
        event.id = String::new();
        assert!(event.validate().is_err());
    }

    #[test]
    fn empty_description_is_valid() {
        let mut event = sample_event();
        event.description = String::new();
        assert!(event.validate().is_ok());
    }
}
