//! Change-log entry for the stories table.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storymill_core::types::Timestamp;

/// Mutation kind recorded in the change log.
///
/// Stored as TEXT; [`ChangeOp::as_str`] and [`ChangeOp::parse`] pin the
/// canonical spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOp {
    /// A new story row was inserted. The only op the pipeline reacts to.
    Insert,
    /// An existing row was patched (a worker set an enrichment field).
    Modify,
    /// A row was deleted (TTL expiry).
    Remove,
}

impl ChangeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOp::Insert => "INSERT",
            ChangeOp::Modify => "MODIFY",
            ChangeOp::Remove => "REMOVE",
        }
    }

    /// Parse a stored op string. Returns `None` for unknown spellings so a
    /// corrupt row can be skipped instead of panicking the reader.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "INSERT" => Some(ChangeOp::Insert),
            "MODIFY" => Some(ChangeOp::Modify),
            "REMOVE" => Some(ChangeOp::Remove),
            _ => None,
        }
    }
}

/// A row from the `story_changes` table.
///
/// One row is appended — in the same transaction as the mutation it
/// describes — for every insert, patch, and expiry of a story. `seq` is a
/// monotonically increasing cursor for the change-capture reader.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub seq: i64,
    /// One of `INSERT`, `MODIFY`, `REMOVE`.
    pub op: String,
    pub story_id: String,
    /// Full wire-shape image of the row after the mutation. `None` for
    /// `REMOVE` changes.
    pub new_image: Option<serde_json::Value>,
    pub occurred_at: Timestamp,
}

impl ChangeRecord {
    /// The parsed op, or `None` if the stored string is not recognized.
    pub fn change_op(&self) -> Option<ChangeOp> {
        ChangeOp::parse(&self.op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_spellings_round_trip() {
        for op in [ChangeOp::Insert, ChangeOp::Modify, ChangeOp::Remove] {
            assert_eq!(ChangeOp::parse(op.as_str()), Some(op));
        }
    }

    #[test]
    fn unknown_op_is_rejected() {
        assert_eq!(ChangeOp::parse("UPSERT"), None);
        assert_eq!(ChangeOp::parse(""), None);
    }
}
