/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Story primary keys are opaque strings (UUID v4, generated at creation).
pub type StoryId = String;

/// Generate a fresh story id.
pub fn new_story_id() -> StoryId {
    uuid::Uuid::new_v4().to_string()
}
