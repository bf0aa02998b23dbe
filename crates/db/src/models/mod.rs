//! Domain model structs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row. Serde renames pin the wire-level field names used in
//! change-log images and event payloads (`createdAt`, `ttl`, `audioURL`,
//! `thumbnailURL`); the column names stay snake_case.

pub mod change;
pub mod character;
pub mod scene;
pub mod story;

pub use change::{ChangeOp, ChangeRecord};
pub use character::Character;
pub use scene::Scene;
pub use story::Story;
