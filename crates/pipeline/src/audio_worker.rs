//! Audio enrichment worker.
//!
//! Consumes one [`StoryGenerated`] event: synthesizes a narration from the
//! story's title and description, stores the MP3 under a key derived from
//! the story id, and patches `audio_url` — the one field this worker owns.

use std::sync::Arc;

use async_trait::async_trait;
use storymill_cloud::ObjectStore;
use storymill_core::config::SIGNED_URL_TTL_SECS;
use storymill_core::PipelineError;
use storymill_db::{RecordStore, StoryField};
use storymill_events::{EventHandler, StoryGenerated};
use storymill_genai::SpeechSynthesizer;

use crate::prompt::narration_text;

/// Narration voice.
pub const NARRATION_VOICE: &str = "Justin";

/// Narration sample rate in Hz.
pub const NARRATION_SAMPLE_RATE: u32 = 24_000;

const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Object key for a story's narration. Stable per story.
pub fn audio_key(story_id: &str) -> String {
    format!("stories/{story_id}/audio.mp3")
}

/// Attaches a synthesized narration to each new story.
pub struct AudioWorker {
    speech: Arc<dyn SpeechSynthesizer>,
    objects: Arc<dyn ObjectStore>,
    store: Arc<dyn RecordStore>,
}

impl AudioWorker {
    pub fn new(
        speech: Arc<dyn SpeechSynthesizer>,
        objects: Arc<dyn ObjectStore>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            speech,
            objects,
            store,
        }
    }
}

#[async_trait]
impl EventHandler for AudioWorker {
    fn name(&self) -> &'static str {
        "audio-worker"
    }

    async fn handle(&self, event: &StoryGenerated) -> Result<(), PipelineError> {
        let text = narration_text(&event.title, &event.description);
        let bytes = self
            .speech
            .synthesize(&text, NARRATION_VOICE, NARRATION_SAMPLE_RATE)
            .await?;

        let key = audio_key(&event.id);
        self.objects.put(&key, bytes, AUDIO_CONTENT_TYPE).await?;
        let signed_url = self
            .objects
            .presigned_get_url(&key, SIGNED_URL_TTL_SECS)
            .await?;

        self.store
            .update_story_field(&event.id, StoryField::AudioUrl, &signed_url)
            .await?;

        tracing::info!(story_id = %event.id, key, "Narration attached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable_per_story() {
        assert_eq!(audio_key("abc"), "stories/abc/audio.mp3");
        assert_eq!(audio_key("abc"), audio_key("abc"));
    }
}
