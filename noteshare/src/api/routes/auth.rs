//! Authentication routes.
//!
//! Registration and login are the only public routes besides health.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};

use crate::api::error::ApiResult;
use crate::api::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::api::server::AppState;

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Malformed input", body = crate::api::error::ApiErrorResponse),
        (status = 422, description = "Email already registered", body = crate::api::error::ApiErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    request.validate()?;

    let user = state
        .auth_service
        .register(
            request.username.trim(),
            request.email.trim(),
            &request.password,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::api::error::ApiErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state
        .auth_service
        .login(request.email.trim(), &request.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: outcome.token,
        expires_in: outcome.expires_in,
    }))
}
