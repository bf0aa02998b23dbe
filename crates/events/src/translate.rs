//! Change-record to domain-event translation.
//!
//! [`translate`] is the schema-validation boundary: only well-formed
//! `INSERT` images become [`StoryGenerated`] events. A partially-populated
//! event is never emitted — a malformed record is rejected as
//! [`PipelineError::InvalidInput`] and the caller drops it.

use storymill_core::PipelineError;
use storymill_db::models::change::{ChangeOp, ChangeRecord};
use validator::Validate;

use crate::event::StoryGenerated;

/// Map a raw change record to the canonical domain event.
///
/// Returns `Ok(None)` for `MODIFY` and `REMOVE` changes: those describe the
/// workers' own patches and TTL expiry of the same logical record, and
/// forwarding them would re-trigger enrichment of an already-enriched
/// story. For `INSERT` changes the event fields are copied verbatim from
/// the new image.
pub fn translate(change: &ChangeRecord) -> Result<Option<StoryGenerated>, PipelineError> {
    let op = change.change_op().ok_or_else(|| {
        PipelineError::InvalidInput(format!("unknown change op \"{}\"", change.op))
    })?;

    if op != ChangeOp::Insert {
        return Ok(None);
    }

    let image = change.new_image.as_ref().ok_or_else(|| {
        PipelineError::InvalidInput(format!(
            "insert change {} has no new image",
            change.seq
        ))
    })?;

    let event = StoryGenerated {
        id: require_str(image, "id")?,
        title: require_str(image, "title")?,
        description: require_str(image, "description")?,
        scene: require_str(image, "scene")?,
    };

    event
        .validate()
        .map_err(|e| PipelineError::InvalidInput(format!("invalid story image: {e}")))?;

    Ok(Some(event))
}

/// Extract a required string field from the new image.
fn require_str(image: &serde_json::Value, field: &str) -> Result<String, PipelineError> {
    image
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            PipelineError::InvalidInput(format!("new image missing string field \"{field}\""))
        })
}
