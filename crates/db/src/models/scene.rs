//! Reference scene entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `scenes` table.
///
/// Scenes are immutable reference data. The generator picks one at random
/// and copies its description into the story, so the story never holds a
/// live reference back to this table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub description: String,
}
