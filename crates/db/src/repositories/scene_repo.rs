//! Repository for the `scenes` table.

use sqlx::PgPool;

use crate::models::scene::Scene;

/// Column list for the `scenes` table.
const COLUMNS: &str = "id, description";

/// Read and seed operations for reference scenes.
pub struct SceneRepo;

impl SceneRepo {
    /// List all scenes. Small reference table; full scan is intended.
    pub async fn list(pool: &PgPool) -> Result<Vec<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes ORDER BY id");
        sqlx::query_as::<_, Scene>(&query).fetch_all(pool).await
    }

    /// Upsert a scene by id. Used by the seed loader.
    pub async fn upsert(pool: &PgPool, scene: &Scene) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO scenes (id, description) \
             VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET description = $2",
        )
        .bind(&scene.id)
        .bind(&scene.description)
        .execute(pool)
        .await?;
        Ok(())
    }
}
