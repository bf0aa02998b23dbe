//! In-memory [`RecordStore`] for tests and local development.
//!
//! Mirrors the Postgres implementation's change-log semantics exactly:
//! every story mutation appends a change record with the full wire-shape
//! new image, under the same lock that applies the mutation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use storymill_core::types::Timestamp;
use storymill_core::PipelineError;

use crate::models::change::{ChangeOp, ChangeRecord};
use crate::models::character::Character;
use crate::models::scene::Scene;
use crate::models::story::{Story, StoryField};
use crate::store::RecordStore;

#[derive(Default)]
struct Inner {
    characters: Vec<Character>,
    scenes: Vec<Scene>,
    stories: HashMap<String, Story>,
    changes: Vec<ChangeRecord>,
    next_seq: i64,
}

impl Inner {
    fn append_change(&mut self, op: ChangeOp, story_id: &str, new_image: Option<&Story>) {
        self.next_seq += 1;
        self.changes.push(ChangeRecord {
            seq: self.next_seq,
            op: op.as_str().to_string(),
            story_id: story_id.to_string(),
            new_image: new_image.map(|s| serde_json::to_value(s).expect("Story serializes")),
            occurred_at: chrono::Utc::now(),
        });
    }
}

/// In-memory record store. Cloneable handles share state via `Arc`.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list_characters(&self) -> Result<Vec<Character>, PipelineError> {
        Ok(self.inner.lock().unwrap().characters.clone())
    }

    async fn list_scenes(&self) -> Result<Vec<Scene>, PipelineError> {
        Ok(self.inner.lock().unwrap().scenes.clone())
    }

    async fn upsert_character(&self, character: &Character) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.characters.retain(|c| c.id != character.id);
        inner.characters.push(character.clone());
        Ok(())
    }

    async fn upsert_scene(&self, scene: &Scene) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.scenes.retain(|s| s.id != scene.id);
        inner.scenes.push(scene.clone());
        Ok(())
    }

    async fn insert_story(&self, story: &Story) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().unwrap();
        inner.stories.insert(story.id.clone(), story.clone());
        inner.append_change(ChangeOp::Insert, &story.id, Some(story));
        Ok(())
    }

    async fn get_story(&self, id: &str) -> Result<Option<Story>, PipelineError> {
        Ok(self.inner.lock().unwrap().stories.get(id).cloned())
    }

    async fn update_story_field(
        &self,
        id: &str,
        field: StoryField,
        value: &str,
    ) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().unwrap();

        let story = match inner.stories.get_mut(id) {
            Some(story) => {
                match field {
                    StoryField::AudioUrl => story.audio_url = Some(value.to_string()),
                    StoryField::ThumbnailUrl => story.thumbnail_url = Some(value.to_string()),
                }
                story.clone()
            }
            None => {
                return Err(PipelineError::InvalidInput(format!(
                    "story {id} not found for {} patch",
                    field.column()
                )))
            }
        };

        inner.append_change(ChangeOp::Modify, id, Some(&story));
        Ok(())
    }

    async fn changes_after(
        &self,
        after: i64,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>, PipelineError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .changes
            .iter()
            .filter(|c| c.seq > after)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn latest_change_seq(&self) -> Result<i64, PipelineError> {
        Ok(self.inner.lock().unwrap().next_seq)
    }

    async fn delete_expired(&self, now: Timestamp) -> Result<u64, PipelineError> {
        let mut inner = self.inner.lock().unwrap();

        let expired: Vec<String> = inner
            .stories
            .values()
            .filter(|s| s.expires_at <= now)
            .map(|s| s.id.clone())
            .collect();

        for id in &expired {
            inner.stories.remove(id);
            inner.append_change(ChangeOp::Remove, id, None);
        }

        Ok(expired.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;

    fn story_with_expiry(expires_at: Timestamp) -> Story {
        Story::new(
            "A Story".to_string(),
            "Words.".to_string(),
            vec![],
            "a quiet forest".to_string(),
            expires_at,
        )
    }

    fn fresh_story() -> Story {
        story_with_expiry(chrono::Utc::now() + chrono::Duration::days(2))
    }

    #[tokio::test]
    async fn insert_appends_insert_change_with_image() {
        let store = MemoryRecordStore::new();
        let story = fresh_story();
        store.insert_story(&story).await.unwrap();

        let changes = store.changes_after(0, 10).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].op, "INSERT");
        assert_eq!(changes[0].story_id, story.id);

        let image = changes[0].new_image.as_ref().unwrap();
        assert_eq!(image["id"], story.id.as_str());
        assert_eq!(image["scene"], "a quiet forest");
    }

    #[tokio::test]
    async fn patch_appends_modify_change_and_sets_field() {
        let store = MemoryRecordStore::new();
        let story = fresh_story();
        store.insert_story(&story).await.unwrap();

        store
            .update_story_field(&story.id, StoryField::AudioUrl, "https://a/audio.mp3")
            .await
            .unwrap();

        let stored = store.get_story(&story.id).await.unwrap().unwrap();
        assert_eq!(stored.audio_url.as_deref(), Some("https://a/audio.mp3"));
        assert!(stored.thumbnail_url.is_none());

        let changes = store.changes_after(0, 10).await.unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].op, "MODIFY");
    }

    #[tokio::test]
    async fn patch_of_missing_story_is_invalid_input() {
        let store = MemoryRecordStore::new();
        let err = store
            .update_story_field("nope", StoryField::ThumbnailUrl, "https://x")
            .await
            .unwrap_err();
        assert_matches!(err, PipelineError::InvalidInput(_));
    }

    #[tokio::test]
    async fn concurrent_disjoint_patches_lose_nothing() {
        let store = Arc::new(MemoryRecordStore::new());
        let story = fresh_story();
        store.insert_story(&story).await.unwrap();

        let audio_store = store.clone();
        let thumb_store = store.clone();
        let audio_id = story.id.clone();
        let thumb_id = story.id.clone();

        let audio = tokio::spawn(async move {
            audio_store
                .update_story_field(&audio_id, StoryField::AudioUrl, "https://a/audio.mp3")
                .await
        });
        let thumb = tokio::spawn(async move {
            thumb_store
                .update_story_field(&thumb_id, StoryField::ThumbnailUrl, "https://a/image.png")
                .await
        });

        audio.await.unwrap().unwrap();
        thumb.await.unwrap().unwrap();

        let stored = store.get_story(&story.id).await.unwrap().unwrap();
        assert!(stored.audio_url.is_some());
        assert!(stored.thumbnail_url.is_some());
    }

    #[tokio::test]
    async fn expiry_sweep_removes_and_logs_remove() {
        let store = MemoryRecordStore::new();
        let expired = story_with_expiry(chrono::Utc::now() - chrono::Duration::hours(1));
        let live = fresh_story();
        store.insert_story(&expired).await.unwrap();
        store.insert_story(&live).await.unwrap();

        let removed = store.delete_expired(chrono::Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_story(&expired.id).await.unwrap().is_none());
        assert!(store.get_story(&live.id).await.unwrap().is_some());

        let changes = store.changes_after(0, 10).await.unwrap();
        let remove = changes.last().unwrap();
        assert_eq!(remove.op, "REMOVE");
        assert_eq!(remove.story_id, expired.id);
        assert!(remove.new_image.is_none());
    }

    #[tokio::test]
    async fn changes_after_respects_cursor_and_limit() {
        let store = MemoryRecordStore::new();
        for _ in 0..3 {
            store.insert_story(&fresh_story()).await.unwrap();
        }

        assert_eq!(store.latest_change_seq().await.unwrap(), 3);
        assert_eq!(store.changes_after(3, 10).await.unwrap().len(), 0);
        assert_eq!(store.changes_after(1, 10).await.unwrap().len(), 2);
        assert_eq!(store.changes_after(0, 1).await.unwrap().len(), 1);
    }
}
