//! Image enrichment worker.
//!
//! Consumes one [`StoryGenerated`] event: generates a thumbnail from the
//! story's scene, stores it under a key derived from the story id, and
//! patches `thumbnail_url` — the one field this worker owns. Any failing
//! step aborts the invocation with no partial write; redelivery is the
//! retry mechanism.

use std::sync::Arc;

use async_trait::async_trait;
use storymill_cloud::{ObjectStore, SecretStore};
use storymill_core::config::{OPENAI_SECRET_NAME, SIGNED_URL_TTL_SECS};
use storymill_core::PipelineError;
use storymill_db::{RecordStore, StoryField};
use storymill_events::{EventHandler, StoryGenerated};
use storymill_genai::ImageGenerator;

/// Requested thumbnail dimensions.
pub const THUMBNAIL_SIZE: &str = "256x256";

const IMAGE_CONTENT_TYPE: &str = "image/png";

/// Object key for a story's thumbnail. Stable per story, so redelivery
/// overwrites the same object instead of accumulating new ones.
pub fn image_key(story_id: &str) -> String {
    format!("stories/{story_id}/image.png")
}

/// Attaches a generated thumbnail to each new story.
pub struct ImageWorker {
    secrets: Arc<dyn SecretStore>,
    images: Arc<dyn ImageGenerator>,
    objects: Arc<dyn ObjectStore>,
    store: Arc<dyn RecordStore>,
    secret_name: String,
}

impl ImageWorker {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        images: Arc<dyn ImageGenerator>,
        objects: Arc<dyn ObjectStore>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            secrets,
            images,
            objects,
            store,
            secret_name: OPENAI_SECRET_NAME.to_string(),
        }
    }

    /// Use a different credential, e.g. when the image capability is the
    /// prediction backend.
    pub fn with_secret_name(mut self, secret_name: impl Into<String>) -> Self {
        self.secret_name = secret_name.into();
        self
    }
}

#[async_trait]
impl EventHandler for ImageWorker {
    fn name(&self) -> &'static str {
        "image-worker"
    }

    async fn handle(&self, event: &StoryGenerated) -> Result<(), PipelineError> {
        let api_key = self.secrets.get_secret(&self.secret_name).await?;

        let provider_url = self
            .images
            .generate_image(&api_key, &event.scene, THUMBNAIL_SIZE)
            .await?;
        let bytes = self.images.fetch_image(&provider_url).await?;

        // Header-only sanity check: refuse to store bytes that are not a
        // recognizable image.
        image::guess_format(&bytes).map_err(|e| {
            PipelineError::UpstreamUnavailable(format!("provider returned non-image data: {e}"))
        })?;

        let key = image_key(&event.id);
        self.objects.put(&key, bytes, IMAGE_CONTENT_TYPE).await?;
        let signed_url = self
            .objects
            .presigned_get_url(&key, SIGNED_URL_TTL_SECS)
            .await?;

        self.store
            .update_story_field(&event.id, StoryField::ThumbnailUrl, &signed_url)
            .await?;

        tracing::info!(story_id = %event.id, key, "Thumbnail attached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable_per_story() {
        assert_eq!(image_key("abc"), "stories/abc/image.png");
        assert_eq!(image_key("abc"), image_key("abc"));
    }
}
