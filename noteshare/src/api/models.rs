//! API request and response models (DTOs).
//!
//! # Model Categories
//!
//! - **Pagination**: page/pageSize parameters and the page wrapper
//! - **Auth**: registration and login
//! - **Notes**: note creation, listing and sharing
//! - **Timeline**: notes shared with the caller
//! - **Health** and **Logging**

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::database::models::{NoteDbModel, TimelineNoteRow};
use crate::database::time::ms_to_datetime;
use crate::domain::AuthUser;
use crate::notification::BroadcastStats;
use crate::{Error, Result};

// ============================================================================
// Pagination
// ============================================================================

pub const MAX_PAGE_SIZE: u32 = 100;
pub const NOTES_PAGE_SIZE: u32 = 30;
pub const TIMELINE_PAGE_SIZE: u32 = 10;

/// Upper bound on id lists in request bodies; keeps `IN (...)` under SQLite's parameter limit.
pub const MAX_IDS_PER_REQUEST: usize = 500;

/// `?page=2&pageSize=20`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number (default: 1)
    pub page: Option<u32>,
    /// Items per page (max: 100)
    pub page_size: Option<u32>,
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl PaginationParams {
    pub fn resolve(&self, default_page_size: u32) -> Result<Page> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(Error::invalid_input("page", "must be at least 1"));
        }

        let page_size = self.page_size.unwrap_or(default_page_size);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::invalid_input(
                "pageSize",
                format!("must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }

        Ok(Page { page, page_size })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: Page) -> Self {
        Self {
            items,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Auth DTOs
// ============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Alphanumeric, at most 128 characters
    pub username: String,
    pub email: String,
    /// 6 to 128 characters
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        let username = self.username.trim();
        if username.is_empty()
            || username.chars().count() > 128
            || !username.chars().all(char::is_alphanumeric)
        {
            return Err(Error::invalid_input(
                "username",
                "must be 1 to 128 alphanumeric characters",
            ));
        }

        let email = self.email.trim();
        let valid_email = email.chars().count() <= 128
            && email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !valid_email {
            return Err(Error::invalid_input("email", "must be a valid email address"));
        }

        let password_len = self.password.chars().count();
        if !(6..=128).contains(&password_len) {
            return Err(Error::invalid_input(
                "password",
                "must be between 6 and 128 characters",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<AuthUser> for UserResponse {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    /// Bearer token
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: u64,
}

// ============================================================================
// Note DTOs
// ============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    /// 3 to 255 characters
    pub title: String,
    /// At least 3 characters
    pub content: String,
    pub type_id: i64,
}

impl CreateNoteRequest {
    pub fn validate(&self) -> Result<()> {
        let title_len = self.title.trim().chars().count();
        if !(3..=255).contains(&title_len) {
            return Err(Error::invalid_input(
                "title",
                "must be between 3 and 255 characters",
            ));
        }
        if self.content.trim().chars().count() < 3 {
            return Err(Error::invalid_input("content", "must be at least 3 characters"));
        }
        if self.type_id <= 0 {
            return Err(Error::invalid_input("typeId", "must be a positive id"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: i64,
    pub sender_id: i64,
    pub title: String,
    pub message: String,
    pub type_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<NoteDbModel> for NoteResponse {
    fn from(note: NoteDbModel) -> Self {
        Self {
            created_at: note.get_created_at(),
            id: note.id,
            sender_id: note.sender_id,
            title: note.title,
            message: note.message,
            type_id: note.type_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareNoteRequest {
    pub recipient_ids: Vec<i64>,
}

impl ShareNoteRequest {
    pub fn validate(&self) -> Result<()> {
        if self.recipient_ids.is_empty() {
            return Err(Error::invalid_input(
                "recipientIds",
                "at least one recipient is required",
            ));
        }
        if self.recipient_ids.len() > MAX_IDS_PER_REQUEST {
            return Err(Error::invalid_input(
                "recipientIds",
                format!("at most {} recipients per request", MAX_IDS_PER_REQUEST),
            ));
        }
        if self.recipient_ids.iter().any(|id| *id <= 0) {
            return Err(Error::invalid_input("recipientIds", "ids must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// Timeline DTOs
// ============================================================================

/// `?page=1&pageSize=10&types=1,4`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TimelineParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Comma-separated note type ids
    pub types: Option<String>,
}

impl TimelineParams {
    pub fn page(&self) -> Result<Page> {
        PaginationParams {
            page: self.page,
            page_size: self.page_size,
        }
        .resolve(TIMELINE_PAGE_SIZE)
    }

    /// Parse `types`; empty or absent means all types.
    pub fn type_ids(&self) -> Result<Vec<i64>> {
        let Some(types) = self.types.as_deref() else {
            return Ok(Vec::new());
        };

        types
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .ok()
                    .filter(|id| *id > 0)
                    .ok_or_else(|| Error::invalid_input("types", format!("'{}' is not a type id", s)))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteTypeRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SenderRef {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineNoteResponse {
    pub id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub note_type: NoteTypeRef,
    pub sender: SenderRef,
    pub created_at: DateTime<Utc>,
    pub shared_at: DateTime<Utc>,
}

impl From<TimelineNoteRow> for TimelineNoteResponse {
    fn from(row: TimelineNoteRow) -> Self {
        Self {
            id: row.note_id,
            title: row.title,
            message: row.message,
            note_type: NoteTypeRef {
                id: row.type_id,
                name: row.type_name,
            },
            sender: SenderRef {
                id: row.sender_id,
                username: row.sender_username,
            },
            created_at: ms_to_datetime(row.created_at),
            shared_at: ms_to_datetime(row.shared_at),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTimelineRequest {
    pub notes_ids: Vec<i64>,
}

impl DeleteTimelineRequest {
    pub fn validate(&self) -> Result<()> {
        if self.notes_ids.is_empty() {
            return Err(Error::invalid_input("notesIds", "at least one note id is required"));
        }
        if self.notes_ids.len() > MAX_IDS_PER_REQUEST {
            return Err(Error::invalid_input(
                "notesIds",
                format!("at most {} note ids per request", MAX_IDS_PER_REQUEST),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Health / Logging DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationHealth {
    pub channels: Vec<String>,
    pub broadcasts: u64,
    pub delivered: u64,
    pub failed: u64,
    pub channel_panics: u64,
    pub queued: usize,
    pub socket_connections: usize,
}

impl NotificationHealth {
    pub fn new(
        channels: Vec<&'static str>,
        stats: BroadcastStats,
        queued: usize,
        socket_connections: usize,
    ) -> Self {
        Self {
            channels: channels.into_iter().map(String::from).collect(),
            broadcasts: stats.broadcasts,
            delivered: stats.delivered,
            failed: stats.failed,
            channel_panics: stats.channel_panics,
            queued,
            socket_connections,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub notifications: NotificationHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoggingFilter {
    /// `tracing` filter directive, e.g. `noteshare=debug,sqlx=warn`
    pub filter: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_pagination_defaults_and_offsets() {
        let page = PaginationParams::default().resolve(NOTES_PAGE_SIZE).unwrap();
        assert_eq!(page, Page { page: 1, page_size: 30 });
        assert_eq!(page.offset(), 0);

        let page = PaginationParams {
            page: Some(3),
            page_size: Some(10),
        }
        .resolve(NOTES_PAGE_SIZE)
        .unwrap();
        assert_eq!(page.limit(), 10);
        assert_eq!(page.offset(), 20);
    }

    #[test]
    fn test_pagination_bounds() {
        let zero_page = PaginationParams {
            page: Some(0),
            page_size: None,
        };
        assert!(zero_page.resolve(10).is_err());

        let too_big = PaginationParams {
            page: None,
            page_size: Some(101),
        };
        assert!(too_big.resolve(10).is_err());
    }

    #[test]
    fn test_register_validation() {
        assert!(register("alice", "alice@example.com", "secret").validate().is_ok());
        assert!(register("al ice", "alice@example.com", "secret").validate().is_err());
        assert!(register("alice", "alice.example.com", "secret").validate().is_err());
        assert!(register("alice", "alice@example.com", "short").validate().is_err());
        assert!(register(&"a".repeat(129), "a@example.com", "secret").validate().is_err());
    }

    #[test]
    fn test_create_note_validation() {
        let ok = CreateNoteRequest {
            title: "Groceries".into(),
            content: "Milk".into(),
            type_id: 1,
        };
        assert!(ok.validate().is_ok());

        let short_title = CreateNoteRequest {
            title: "Hi".into(),
            ..ok.clone()
        };
        assert!(short_title.validate().is_err());
    }

    #[test]
    fn test_share_request_validation() {
        assert!(ShareNoteRequest { recipient_ids: vec![] }.validate().is_err());
        assert!(ShareNoteRequest { recipient_ids: vec![2, -1] }.validate().is_err());
        assert!(ShareNoteRequest { recipient_ids: vec![2, 3] }.validate().is_ok());
    }

    #[test]
    fn test_id_lists_are_capped() {
        let at_limit: Vec<i64> = (1..=MAX_IDS_PER_REQUEST as i64).collect();
        let over_limit: Vec<i64> = (1..=MAX_IDS_PER_REQUEST as i64 + 1).collect();

        assert!(ShareNoteRequest { recipient_ids: at_limit.clone() }.validate().is_ok());
        assert!(matches!(
            ShareNoteRequest { recipient_ids: over_limit.clone() }.validate(),
            Err(Error::InvalidInput { .. })
        ));
        assert!(DeleteTimelineRequest { notes_ids: at_limit }.validate().is_ok());
        assert!(DeleteTimelineRequest { notes_ids: over_limit }.validate().is_err());
    }

    #[test]
    fn test_share_request_camel_case() {
        let req: ShareNoteRequest = serde_json::from_str(r#"{"recipientIds":[2,3]}"#).unwrap();
        assert_eq!(req.recipient_ids, vec![2, 3]);

        let req: DeleteTimelineRequest = serde_json::from_str(r#"{"notesIds":[5]}"#).unwrap();
        assert_eq!(req.notes_ids, vec![5]);
    }

    #[test]
    fn test_timeline_type_parsing() {
        let params = TimelineParams {
            types: Some("1, 4,,7".into()),
            ..Default::default()
        };
        assert_eq!(params.type_ids().unwrap(), vec![1, 4, 7]);
        assert!(TimelineParams::default().type_ids().unwrap().is_empty());

        let bad = TimelineParams {
            types: Some("1,x".into()),
            ..Default::default()
        };
        assert!(bad.type_ids().is_err());
    }

    #[test]
    fn test_timeline_default_page_size() {
        assert_eq!(TimelineParams::default().page().unwrap().page_size, 10);
    }
}
