//! Reference character entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `characters` table.
///
/// Characters are immutable reference data, seeded once and read-only to
/// the pipeline. Stories embed full snapshots of the characters they were
/// generated from, so later edits to this table never change past stories.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
