//! The [`RecordStore`] trait and its Postgres implementation.
//!
//! Pipeline components receive an `Arc<dyn RecordStore>` instead of a pool
//! so tests can substitute [`MemoryRecordStore`](crate::MemoryRecordStore)
//! without any global state. Store failures surface as
//! [`PipelineError::UpstreamUnavailable`] so the subscriber runner treats
//! them as retryable.

use async_trait::async_trait;
use storymill_core::types::Timestamp;
use storymill_core::PipelineError;

use crate::models::change::ChangeRecord;
use crate::models::character::Character;
use crate::models::scene::Scene;
use crate::models::story::{Story, StoryField};
use crate::repositories::{ChangeLogRepo, CharacterRepo, SceneRepo, StoryRepo};
use crate::DbPool;

/// Keyed storage for reference data and generated stories, plus the
/// append-only change log the capture reader tails.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All reference characters.
    async fn list_characters(&self) -> Result<Vec<Character>, PipelineError>;

    /// All reference scenes.
    async fn list_scenes(&self) -> Result<Vec<Scene>, PipelineError>;

    /// Seed one character (upsert by id).
    async fn upsert_character(&self, character: &Character) -> Result<(), PipelineError>;

    /// Seed one scene (upsert by id).
    async fn upsert_scene(&self, scene: &Scene) -> Result<(), PipelineError>;

    /// Insert a new story and its `INSERT` change record atomically.
    async fn insert_story(&self, story: &Story) -> Result<(), PipelineError>;

    /// Fetch a story by id.
    async fn get_story(&self, id: &str) -> Result<Option<Story>, PipelineError>;

    /// Patch exactly one enrichment field of a story.
    ///
    /// Fails with [`PipelineError::InvalidInput`] if the story no longer
    /// exists — redelivering the event cannot make an expired story
    /// reappear, so the event is dropped rather than retried.
    async fn update_story_field(
        &self,
        id: &str,
        field: StoryField,
        value: &str,
    ) -> Result<(), PipelineError>;

    /// Up to `limit` change records with `seq > after`, oldest first.
    async fn changes_after(&self, after: i64, limit: i64)
        -> Result<Vec<ChangeRecord>, PipelineError>;

    /// Highest change sequence currently in the log (0 when empty).
    async fn latest_change_seq(&self) -> Result<i64, PipelineError>;

    /// Delete stories past their expiry. Returns the number deleted.
    async fn delete_expired(&self, now: Timestamp) -> Result<u64, PipelineError>;
}

// ---------------------------------------------------------------------------
// PgRecordStore
// ---------------------------------------------------------------------------

/// Production [`RecordStore`] backed by Postgres via the repository layer.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list_characters(&self) -> Result<Vec<Character>, PipelineError> {
        CharacterRepo::list(&self.pool)
            .await
            .map_err(PipelineError::upstream)
    }

    async fn list_scenes(&self) -> Result<Vec<Scene>, PipelineError> {
        SceneRepo::list(&self.pool)
            .await
            .map_err(PipelineError::upstream)
    }

    async fn upsert_character(&self, character: &Character) -> Result<(), PipelineError> {
        CharacterRepo::upsert(&self.pool, character)
            .await
            .map_err(PipelineError::upstream)
    }

    async fn upsert_scene(&self, scene: &Scene) -> Result<(), PipelineError> {
        SceneRepo::upsert(&self.pool, scene)
            .await
            .map_err(PipelineError::upstream)
    }

    async fn insert_story(&self, story: &Story) -> Result<(), PipelineError> {
        StoryRepo::insert(&self.pool, story)
            .await
            .map_err(PipelineError::upstream)
    }

    async fn get_story(&self, id: &str) -> Result<Option<Story>, PipelineError> {
        StoryRepo::find_by_id(&self.pool, id)
            .await
            .map_err(PipelineError::upstream)
    }

    async fn update_story_field(
        &self,
        id: &str,
        field: StoryField,
        value: &str,
    ) -> Result<(), PipelineError> {
        let updated = StoryRepo::update_field(&self.pool, id, field, value)
            .await
            .map_err(PipelineError::upstream)?;

        match updated {
            Some(_) => Ok(()),
            None => Err(PipelineError::InvalidInput(format!(
                "story {id} not found for {} patch",
                field.column()
            ))),
        }
    }

    async fn changes_after(
        &self,
        after: i64,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>, PipelineError> {
        ChangeLogRepo::list_after(&self.pool, after, limit)
            .await
            .map_err(PipelineError::upstream)
    }

    async fn latest_change_seq(&self) -> Result<i64, PipelineError> {
        ChangeLogRepo::latest_seq(&self.pool)
            .await
            .map_err(PipelineError::upstream)
    }

    async fn delete_expired(&self, now: Timestamp) -> Result<u64, PipelineError> {
        StoryRepo::delete_expired(&self.pool, now)
            .await
            .map_err(PipelineError::upstream)
    }
}
