//! Share record (user-note association) models and read projections.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A note made visible to `user_id`.
///
/// A non-null `deleted_at` marks the record as removed from the recipient's
/// timeline. Soft-deleted records are kept for audit and ignored by every
/// read path.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserNoteDbModel {
    pub id: i64,
    pub user_id: i64,
    pub note_id: i64,
    pub created_at: i64,
    pub deleted_at: Option<i64>,
}

impl UserNoteDbModel {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// An active share that already exists for a recipient, with the recipient's name.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct ExistingShare {
    pub user_id: i64,
    pub username: String,
}

/// A note as it appears on a recipient's timeline.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct TimelineNoteRow {
    pub note_id: i64,
    pub title: String,
    pub message: String,
    pub type_id: i64,
    pub type_name: String,
    pub sender_id: i64,
    pub sender_username: String,
    pub created_at: i64,
    pub shared_at: i64,
}

/// One received share flattened with its recipient and note type, used by the digest.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct ShareSummaryRow {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub type_name: String,
}
