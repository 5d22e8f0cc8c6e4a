//! JWT authentication middleware.
//!
//! Validates the bearer token and injects the caller's [`AuthUser`](crate::domain::AuthUser) into
//! request extensions for downstream handlers.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::error::ApiError;
use crate::api::jwt::{JwtError, JwtService};

#[derive(Debug)]
pub enum JwtAuthError {
    /// Missing Authorization header
    MissingToken,
    /// Not a `Bearer` credential
    InvalidFormat,
    InvalidToken(JwtError),
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let message = match self {
            JwtAuthError::MissingToken => "Missing authorization token",
            JwtAuthError::InvalidFormat => "Invalid token format",
            JwtAuthError::InvalidToken(JwtError::TokenExpired) => "Token has expired",
            JwtAuthError::InvalidToken(_) => "Invalid token",
        };
        ApiError::unauthorized(message).into_response()
    }
}

fn extract_bearer_token(request: &Request) -> Result<&str, JwtAuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(JwtAuthError::MissingToken)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| JwtAuthError::InvalidFormat)?;

    auth_str
        .strip_prefix("Bearer ")
        .ok_or(JwtAuthError::InvalidFormat)
}

/// Use with `axum::middleware::from_fn_with_state(jwt_service, jwt_auth_middleware)`.
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, JwtAuthError> {
    let token = extract_bearer_token(&request)?;

    let user = jwt_service
        .authenticate(token)
        .map_err(JwtAuthError::InvalidToken)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
