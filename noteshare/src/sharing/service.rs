//! Share workflow: validate, persist, then schedule the notification.

use std::sync::Arc;

use tracing::info;

use super::validator::{ShareDecision, ShareRejection, ShareValidator};
use crate::database::models::NoteDbModel;
use crate::database::repositories::{NoteRepository, ShareRepository, UserRepository};
use crate::domain::AuthUser;
use crate::notification::{Notification, NotificationOptions, NotificationScheduler};
use crate::{Error, Result};

/// Shortest preview a notification may carry.
pub const MIN_PREVIEW_CHARS: usize = 20;
pub const DEFAULT_PREVIEW_CHARS: usize = 50;

pub const SHARE_SUCCESS_MESSAGE: &str = "Note shared successfully";

#[derive(Debug, Clone)]
pub struct ShareServiceConfig {
    /// Characters of the note body sent in the notification.
    pub preview_chars: usize,
}

impl Default for ShareServiceConfig {
    fn default() -> Self {
        Self {
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared {
        note_id: i64,
        recipient_ids: Vec<i64>,
        /// False when the dispatcher dropped the notification.
        notification_scheduled: bool,
    },
    Rejected(ShareRejection),
}

pub struct ShareService {
    validator: ShareValidator,
    notes: Arc<dyn NoteRepository>,
    shares: Arc<dyn ShareRepository>,
    scheduler: Arc<dyn NotificationScheduler>,
    config: ShareServiceConfig,
}

impl ShareService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notes: Arc<dyn NoteRepository>,
        shares: Arc<dyn ShareRepository>,
        scheduler: Arc<dyn NotificationScheduler>,
        config: ShareServiceConfig,
    ) -> Self {
        Self {
            validator: ShareValidator::new(users, shares.clone()),
            notes,
            shares,
            scheduler,
            config: ShareServiceConfig {
                preview_chars: config.preview_chars.max(MIN_PREVIEW_CHARS),
            },
        }
    }

    /// Resolve the note and check ownership, then share it.
    pub async fn share_note_by_id(
        &self,
        sharer: &AuthUser,
        note_id: i64,
        recipient_ids: &[i64],
    ) -> Result<ShareOutcome> {
        let note = self
            .notes
            .get_by_id(note_id)
            .await?
            .ok_or_else(|| Error::not_found("Note", note_id))?;

        if !note.is_owned_by(sharer.id) {
            return Err(Error::unauthorized("Only the sender of a note can share it"));
        }

        self.share_note(sharer, &note, recipient_ids).await
    }

    /// Share `note` with `recipient_ids`. The caller has already checked that
    /// `sharer` owns the note.
    ///
    /// The notification is queued, never awaited: its delivery cannot change
    /// the outcome returned here.
    pub async fn share_note(
        &self,
        sharer: &AuthUser,
        note: &NoteDbModel,
        recipient_ids: &[i64],
    ) -> Result<ShareOutcome> {
        if recipient_ids.is_empty() {
            return Err(Error::invalid_input(
                "recipientIds",
                "at least one recipient is required",
            ));
        }

        if let ShareDecision::Rejected(rejection) = self
            .validator
            .validate(sharer.id, note.id, recipient_ids)
            .await?
        {
            info!(
                note_id = note.id,
                sharer_id = sharer.id,
                reason = rejection.reason(),
                "Share rejected"
            );
            return Ok(ShareOutcome::Rejected(rejection));
        }

        // Concurrent shares can still collide here; the unique index turns that into Conflict.
        let created = self.shares.create_many(note.id, recipient_ids).await?;
        info!(
            note_id = note.id,
            sharer_id = sharer.id,
            recipients = ?recipient_ids,
            created,
            "Note shared"
        );

        let notification_scheduled = self
            .scheduler
            .schedule(self.build_notification(sharer, note, recipient_ids));

        Ok(ShareOutcome::Shared {
            note_id: note.id,
            recipient_ids: recipient_ids.to_vec(),
            notification_scheduled,
        })
    }

    fn build_notification(
        &self,
        sharer: &AuthUser,
        note: &NoteDbModel,
        recipient_ids: &[i64],
    ) -> Notification {
        Notification::new(
            format!("{} sent you a new note", sharer.username),
            note.preview(self.config.preview_chars),
            NotificationOptions::new().with_socket_recipients(recipient_ids.to_vec()),
        )
    }
}
