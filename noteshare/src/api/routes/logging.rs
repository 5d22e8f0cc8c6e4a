//! Logging API routes.
//!
//! Read and replace the runtime log filter.

use axum::{Json, Router, extract::State, routing::get};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::LoggingFilter;
use crate::api::server::AppState;

/// Create the logging router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_logging_config).put(update_logging_config))
}

#[utoipa::path(
    get,
    path = "/api/logging",
    tag = "logging",
    responses(
        (status = 200, description = "Current log filter", body = LoggingFilter)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_logging_config(State(state): State<AppState>) -> ApiResult<Json<LoggingFilter>> {
    let logging_config = state
        .logging_config
        .as_ref()
        .ok_or_else(|| ApiError::internal("Logging configuration not available"))?;

    Ok(Json(LoggingFilter {
        filter: logging_config.get_filter(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/logging",
    tag = "logging",
    request_body = LoggingFilter,
    responses(
        (status = 200, description = "Log filter updated", body = LoggingFilter),
        (status = 400, description = "Invalid filter", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_logging_config(
    State(state): State<AppState>,
    Json(request): Json<LoggingFilter>,
) -> ApiResult<Json<LoggingFilter>> {
    let logging_config = state
        .logging_config
        .as_ref()
        .ok_or_else(|| ApiError::internal("Logging configuration not available"))?;

    logging_config.set_filter(request.filter.trim())?;
    tracing::info!(filter = %request.filter, "Log filter updated");

    Ok(Json(LoggingFilter {
        filter: logging_config.get_filter(),
    }))
}
