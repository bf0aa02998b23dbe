//! Repository for the `characters` table.

use sqlx::PgPool;

use crate::models::character::Character;

/// Column list for the `characters` table.
const COLUMNS: &str = "id, name, description";

/// Read and seed operations for reference characters.
pub struct CharacterRepo;

impl CharacterRepo {
    /// List all characters. The table is small reference data, so a full
    /// scan is the intended access pattern.
    pub async fn list(pool: &PgPool) -> Result<Vec<Character>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM characters ORDER BY name");
        sqlx::query_as::<_, Character>(&query).fetch_all(pool).await
    }

    /// Upsert a character by id. Used by the seed loader; re-running the
    /// seed overwrites rather than duplicates.
    pub async fn upsert(pool: &PgPool, character: &Character) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO characters (id, name, description) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET name = $2, description = $3",
        )
        .bind(&character.id)
        .bind(&character.name)
        .bind(&character.description)
        .execute(pool)
        .await?;
        Ok(())
    }
}
