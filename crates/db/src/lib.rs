//! Record store for the storymill pipeline.
//!
//! The keyed tables (characters, scenes, stories) and the stories change
//! log live behind the [`RecordStore`] trait so every consumer — generator,
//! enrichment workers, change capture — can be tested against the in-memory
//! fake. [`PgRecordStore`] is the production implementation; each mutation
//! of the stories table appends a change-log row in the same transaction,
//! which is what the change-capture reader tails.

pub mod expiry;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use expiry::ExpirySweeper;
pub use memory::MemoryRecordStore;
pub use models::story::StoryField;
pub use store::{PgRecordStore, RecordStore};

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}
