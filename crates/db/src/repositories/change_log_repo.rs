//! Repository for the `story_changes` table.

use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::change::{ChangeOp, ChangeRecord};
use crate::models::story::Story;

/// Column list for the `story_changes` table.
const COLUMNS: &str = "seq, op, story_id, new_image, occurred_at";

/// Append and tail operations for the stories change log.
pub struct ChangeLogRepo;

impl ChangeLogRepo {
    /// Append one change row within an existing transaction.
    ///
    /// Always called from [`StoryRepo`](crate::repositories::StoryRepo)
    /// alongside the mutation it describes, never on its own.
    pub async fn append(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        op: ChangeOp,
        story_id: &str,
        new_image: Option<&Story>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO story_changes (op, story_id, new_image) VALUES ($1, $2, $3)")
            .bind(op.as_str())
            .bind(story_id)
            .bind(new_image.map(Json))
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Fetch up to `limit` change rows with `seq` greater than `after`,
    /// oldest first.
    pub async fn list_after(
        pool: &PgPool,
        after: i64,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM story_changes WHERE seq > $1 ORDER BY seq LIMIT $2");
        sqlx::query_as::<_, ChangeRecord>(&query)
            .bind(after)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// The highest sequence number currently in the log, or 0 if empty.
    ///
    /// The reader starts from here so historical inserts are not replayed.
    pub async fn latest_seq(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COALESCE(MAX(seq), 0) FROM story_changes")
            .fetch_one(pool)
            .await
    }
}
