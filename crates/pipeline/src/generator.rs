//! Content generator.
//!
//! [`StoryGenerator::run`] is the entry point the scheduled trigger
//! invokes: no arguments, one new story per successful invocation. It is
//! deliberately not idempotent — every run creates a distinct record — and
//! it performs no internal retry; a failure surfaces to the trigger, which
//! owns the retry policy.

use std::sync::Arc;

use rand::Rng;
use storymill_cloud::SecretStore;
use storymill_core::config::{OPENAI_SECRET_NAME, STORY_RETENTION};
use storymill_core::PipelineError;
use storymill_db::models::story::Story;
use storymill_db::RecordStore;
use storymill_genai::TextGenerator;

use crate::prompt::build_story_prompt;

/// Bounded completion parameters for story generation.
pub const STORY_MAX_TOKENS: u32 = 1000;
pub const STORY_TEMPERATURE: f32 = 0.7;

/// Generates one story per invocation.
pub struct StoryGenerator {
    store: Arc<dyn RecordStore>,
    secrets: Arc<dyn SecretStore>,
    text: Arc<dyn TextGenerator>,
}

impl StoryGenerator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        secrets: Arc<dyn SecretStore>,
        text: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            store,
            secrets,
            text,
        }
    }

    /// Generate and insert exactly one new story.
    ///
    /// The insert is the last step, so any earlier failure — missing
    /// credential, empty reference data, provider error — aborts the
    /// invocation with no partial record written.
    pub async fn run(&self) -> Result<Story, PipelineError> {
        let api_key = self.secrets.get_secret(OPENAI_SECRET_NAME).await?;

        let characters = self.store.list_characters().await?;
        if characters.is_empty() {
            return Err(PipelineError::InvalidInput(
                "no reference characters seeded".to_string(),
            ));
        }

        let scenes = self.store.list_scenes().await?;
        if scenes.is_empty() {
            return Err(PipelineError::InvalidInput(
                "no reference scenes seeded".to_string(),
            ));
        }

        // Select one scene uniformly at random.
        let scene = &scenes[rand::rng().random_range(0..scenes.len())];

        let prompt = build_story_prompt(&characters, &scene.description);
        let completion = self
            .text
            .complete(&api_key, &prompt, STORY_MAX_TOKENS, STORY_TEMPERATURE)
            .await?;

        let (title, description) = split_completion(&completion)?;

        let expires_at =
            chrono::Utc::now() + chrono::Duration::seconds(STORY_RETENTION.as_secs() as i64);
        let story = Story::new(
            title,
            description,
            characters,
            scene.description.clone(),
            expires_at,
        );

        self.store.insert_story(&story).await?;

        tracing::info!(story_id = %story.id, title = %story.title, "Story generated");
        Ok(story)
    }
}

/// Split a completion into title and description: the first line is the
/// title, the remaining lines joined form the description.
fn split_completion(completion: &str) -> Result<(String, String), PipelineError> {
    let trimmed = completion.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::UpstreamUnavailable(
            "completion was empty".to_string(),
        ));
    }

    let mut lines = trimmed.split('\n');
    let title = lines.next().unwrap_or_default().to_string();
    let description = lines.collect::<Vec<_>>().join("\n");
    Ok((title, description))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use storymill_db::models::character::Character;
    use storymill_db::models::scene::Scene;
    use storymill_db::MemoryRecordStore;

    use super::*;

    struct FakeSecrets;

    #[async_trait]
    impl SecretStore for FakeSecrets {
        async fn get_secret(&self, _name: &str) -> Result<String, PipelineError> {
            Ok("sk-test".to_string())
        }
    }

    struct FakeText {
        completion: String,
    }

    #[async_trait]
    impl TextGenerator for FakeText {
        async fn complete(
            &self,
            _api_key: &str,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, PipelineError> {
            Ok(self.completion.clone())
        }
    }

    async fn seeded_store() -> Arc<MemoryRecordStore> {
        let store = Arc::new(MemoryRecordStore::new());
        for name in ["Ana", "Leo"] {
            store
                .upsert_character(&Character {
                    id: name.to_lowercase(),
                    name: name.to_string(),
                    description: None,
                })
                .await
                .unwrap();
        }
        store
            .upsert_scene(&Scene {
                id: "forest".to_string(),
                description: "a quiet forest".to_string(),
            })
            .await
            .unwrap();
        store
    }

    fn generator(store: Arc<MemoryRecordStore>, completion: &str) -> StoryGenerator {
        StoryGenerator::new(
            store,
            Arc::new(FakeSecrets),
            Arc::new(FakeText {
                completion: completion.to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn inserts_exactly_one_story_with_snapshots() {
        let store = seeded_store().await;
        let gen = generator(store.clone(), "The Quiet Forest\nLine one.\nLine two.");

        let story = gen.run().await.unwrap();

        assert_eq!(story.title, "The Quiet Forest");
        assert_eq!(story.description, "Line one.\nLine two.");
        assert_eq!(story.characters.len(), 2);
        assert_eq!(story.scene, "a quiet forest");
        assert!(story.audio_url.is_none());
        assert!(story.thumbnail_url.is_none());

        // Exactly one story inserted, one INSERT change logged.
        let changes = store.changes_after(0, 10).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].op, "INSERT");
        assert!(store.get_story(&story.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn single_scene_is_always_selected() {
        let store = seeded_store().await;
        let gen = generator(store.clone(), "Title\nBody");

        for _ in 0..5 {
            let story = gen.run().await.unwrap();
            assert_eq!(story.scene, "a quiet forest");
        }
    }

    #[tokio::test]
    async fn each_invocation_creates_a_distinct_record() {
        let store = seeded_store().await;
        let gen = generator(store.clone(), "Title\nBody");

        let a = gen.run().await.unwrap();
        let b = gen.run().await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn empty_characters_fail_without_partial_write() {
        let store = Arc::new(MemoryRecordStore::new());
        store
            .upsert_scene(&Scene {
                id: "forest".to_string(),
                description: "a quiet forest".to_string(),
            })
            .await
            .unwrap();
        let gen = generator(store.clone(), "Title\nBody");

        let err = gen.run().await.unwrap_err();
        assert_matches!(err, PipelineError::InvalidInput(_));
        assert_eq!(store.changes_after(0, 10).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn empty_scenes_fail_without_partial_write() {
        let store = Arc::new(MemoryRecordStore::new());
        store
            .upsert_character(&Character {
                id: "ana".to_string(),
                name: "Ana".to_string(),
                description: None,
            })
            .await
            .unwrap();
        let gen = generator(store.clone(), "Title\nBody");

        let err = gen.run().await.unwrap_err();
        assert_matches!(err, PipelineError::InvalidInput(_));
        assert_eq!(store.changes_after(0, 10).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn empty_completion_is_upstream_failure() {
        let store = seeded_store().await;
        let gen = generator(store.clone(), "   ");

        let err = gen.run().await.unwrap_err();
        assert_matches!(err, PipelineError::UpstreamUnavailable(_));
        assert_eq!(store.changes_after(0, 10).await.unwrap().len(), 0);
    }

    #[test]
    fn single_line_completion_has_empty_description() {
        let (title, description) = split_completion("Just a Title").unwrap();
        assert_eq!(title, "Just a Title");
        assert_eq!(description, "");
    }
}
