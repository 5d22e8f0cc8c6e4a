//! Note and note type database models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A note authored by `sender_id`. Notes are immutable once created.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteDbModel {
    pub id: i64,
    pub sender_id: i64,
    pub title: String,
    pub message: String,
    pub type_id: i64,
    pub created_at: i64,
}

impl NoteDbModel {
    /// Get created_at as `DateTime<Utc>`.
    pub fn get_created_at(&self) -> DateTime<Utc> {
        crate::database::time::ms_to_datetime(self.created_at)
    }

    /// Whether `user_id` authored this note.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.sender_id == user_id
    }

    /// First `max_chars` characters of the message, split on char boundaries.
    pub fn preview(&self, max_chars: usize) -> String {
        self.message.chars().take(max_chars).collect()
    }
}

/// Insert payload for a new note.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub sender_id: i64,
    pub title: String,
    pub message: String,
    pub type_id: i64,
}

/// Note category. Notes of a disabled type are hidden from timelines.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteTypeDbModel {
    pub id: i64,
    pub name: String,
    pub disabled: bool,
}
