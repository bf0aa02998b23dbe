//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Story mutations go through
//! [`StoryRepo`], which appends the matching change-log row inside the same
//! transaction.

pub mod change_log_repo;
pub mod character_repo;
pub mod scene_repo;
pub mod story_repo;

pub use change_log_repo::ChangeLogRepo;
pub use character_repo::CharacterRepo;
pub use scene_repo::SceneRepo;
pub use story_repo::StoryRepo;
