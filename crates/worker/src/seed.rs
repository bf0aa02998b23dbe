//! One-shot reference-data loader.
//!
//! Reads `characters.json` and `scenes.json` and upserts their contents
//! through the record store. Re-running is safe: rows are keyed by id and
//! overwritten, not duplicated.
//!
//! Usage: `storymill-seed [characters.json] [scenes.json]`

use std::sync::Arc;

use storymill_db::models::character::Character;
use storymill_db::models::scene::Scene;
use storymill_db::{PgRecordStore, RecordStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let characters_path = args.next().unwrap_or_else(|| "data/characters.json".to_string());
    let scenes_path = args.next().unwrap_or_else(|| "data/scenes.json".to_string());

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = storymill_db::create_pool(&database_url).await?;
    sqlx::migrate!("../db/migrations").run(&pool).await?;
    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool));

    let characters: Vec<Character> =
        serde_json::from_str(&std::fs::read_to_string(&characters_path)?)?;
    for character in &characters {
        store.upsert_character(character).await?;
    }
    tracing::info!(count = characters.len(), path = %characters_path, "Characters seeded");

    let scenes: Vec<Scene> = serde_json::from_str(&std::fs::read_to_string(&scenes_path)?)?;
    for scene in &scenes {
        store.upsert_scene(scene).await?;
    }
    tracing::info!(count = scenes.len(), path = %scenes_path, "Scenes seeded");

    Ok(())
}
