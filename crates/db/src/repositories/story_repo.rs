//! Repository for the `stories` table.
//!
//! Every mutation appends a row to `story_changes` inside the same
//! transaction, so the change log never diverges from the table it
//! describes. The change-capture reader tails that log.

use sqlx::types::Json;
use sqlx::PgPool;
use storymill_core::types::Timestamp;

use crate::models::change::ChangeOp;
use crate::models::story::{Story, StoryField};
use crate::repositories::change_log_repo::ChangeLogRepo;

/// Column list for the `stories` table.
const COLUMNS: &str =
    "id, title, description, characters, scene, created_at, expires_at, audio_url, thumbnail_url";

/// CRUD operations for generated stories.
pub struct StoryRepo;

impl StoryRepo {
    /// Insert a new story and append the `INSERT` change record.
    pub async fn insert(pool: &PgPool, story: &Story) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO stories \
                (id, title, description, characters, scene, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&story.id)
        .bind(&story.title)
        .bind(&story.description)
        .bind(Json(&story.characters))
        .bind(&story.scene)
        .bind(story.created_at)
        .bind(story.expires_at)
        .execute(&mut *tx)
        .await?;

        ChangeLogRepo::append(&mut tx, ChangeOp::Insert, &story.id, Some(story)).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Find a story by its id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE id = $1");
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Patch exactly one enrichment field and append the `MODIFY` change
    /// record.
    ///
    /// The update targets a single column so a concurrent patch of the
    /// sibling field is never clobbered. Returns `None` if no row with the
    /// given `id` exists (e.g. it already expired).
    pub async fn update_field(
        pool: &PgPool,
        id: &str,
        field: StoryField,
        value: &str,
    ) -> Result<Option<Story>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE stories SET {} = $2 WHERE id = $1 RETURNING {COLUMNS}",
            field.column()
        );
        let story = sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(value)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(ref story) = story {
            ChangeLogRepo::append(&mut tx, ChangeOp::Modify, &story.id, Some(story)).await?;
        }

        tx.commit().await?;
        Ok(story)
    }

    /// Delete all stories past their expiry and append one `REMOVE` change
    /// record per deleted row. Returns the number of rows deleted.
    pub async fn delete_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let ids: Vec<String> =
            sqlx::query_scalar("DELETE FROM stories WHERE expires_at <= $1 RETURNING id")
                .bind(now)
                .fetch_all(&mut *tx)
                .await?;

        for id in &ids {
            ChangeLogRepo::append(&mut tx, ChangeOp::Remove, id, None).await?;
        }

        tx.commit().await?;
        Ok(ids.len() as u64)
    }
}
