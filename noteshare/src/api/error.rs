//! API error handling.
//!
//! Every handler error becomes a JSON body `{code, message, details?}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::api::auth_service::AuthError;
use crate::error::Error;
use crate::sharing::ShareRejection;

/// API error response body.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 400: malformed input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// 422: uniqueness or share-state conflict.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "CONFLICT", message)
    }

    /// 422: well-formed but semantically invalid.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidInput { field, message } => ApiError::bad_request(format!(
                "{}: {}",
                field, message
            ))
            .with_details(serde_json::json!({ "field": field })),
            Error::Unauthorized(msg) => ApiError::unauthorized(msg),
            Error::NotFound { entity_type, id } => {
                ApiError::not_found(format!("{} with id '{}' not found", entity_type, id))
            }
            Error::Conflict(msg) => {
                tracing::debug!("Conflict: {}", msg);
                ApiError::conflict("The request conflicts with existing data")
            }
            Error::Validation(msg) => ApiError::validation(msg),
            Error::DatabaseSqlx(e) => {
                tracing::error!("Database error: {}", e);
                ApiError::internal("Database error occurred")
            }
            Error::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                ApiError::internal("Database error occurred")
            }
            Error::Io(e) => {
                tracing::error!("IO error: {}", e);
                ApiError::internal("IO error occurred")
            }
            _ => {
                tracing::error!("Unexpected error: {}", err);
                ApiError::internal("An unexpected error occurred")
            }
        }
    }
}

impl From<ShareRejection> for ApiError {
    fn from(rejection: ShareRejection) -> Self {
        let details = match &rejection {
            ShareRejection::SelfShare => serde_json::json!({ "reason": rejection.reason() }),
            ShareRejection::InvalidRecipients { ids } => {
                serde_json::json!({ "reason": rejection.reason(), "ids": ids })
            }
            ShareRejection::AlreadyShared { usernames } => {
                serde_json::json!({ "reason": rejection.reason(), "usernames": usernames })
            }
        };
        ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "SHARE_REJECTED",
            rejection.to_string(),
        )
        .with_details(details)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid email or password"),
            AuthError::EmailTaken => ApiError::conflict("Email is already registered"),
            AuthError::Token(e) => {
                tracing::error!("Token issuance failed: {}", e);
                ApiError::internal("Failed to issue token")
            }
            AuthError::Store(e) => e.into(),
            AuthError::Internal(msg) => {
                tracing::error!("Auth failure: {}", msg);
                ApiError::internal("Authentication failed")
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::invalid_input("title", "too short"), StatusCode::BAD_REQUEST),
            (Error::unauthorized("nope"), StatusCode::UNAUTHORIZED),
            (Error::not_found("Note", 5), StatusCode::NOT_FOUND),
            (Error::conflict("dup"), StatusCode::UNPROCESSABLE_ENTITY),
            (Error::validation("bad ids"), StatusCode::UNPROCESSABLE_ENTITY),
            (Error::Other("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_not_found_message_names_entity() {
        let api_err: ApiError = Error::not_found("Note", "123").into();
        assert!(api_err.message.contains("Note"));
        assert!(api_err.message.contains("123"));
    }

    #[test]
    fn test_share_rejection_is_422_with_reason() {
        let api_err: ApiError = ShareRejection::InvalidRecipients { ids: vec![7] }.into();

        assert_eq!(api_err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api_err.code, "SHARE_REJECTED");
        let details = api_err.details.unwrap();
        assert_eq!(details["reason"], "invalid recipients");
        assert_eq!(details["ids"], serde_json::json!([7]));
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::EmailTaken).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
