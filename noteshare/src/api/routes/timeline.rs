//! Timeline routes: notes shared with the caller.

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{
    DeleteTimelineRequest, MessageResponse, PaginatedResponse, TimelineNoteResponse,
    TimelineParams,
};
use crate::api::server::AppState;
use crate::database::repositories::TimelineQuery;
use crate::database::time::{now_ms, window_start_ms};
use crate::domain::AuthUser;
use crate::sharing::validator::unresolved_ids;

/// Create the timeline router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_timeline).delete(delete_from_timeline))
}

#[utoipa::path(
    get,
    path = "/api/timeline",
    tag = "timeline",
    params(TimelineParams),
    responses(
        (status = 200, description = "Notes shared with the caller, newest first", body = PaginatedResponse<TimelineNoteResponse>),
        (status = 400, description = "Malformed query", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_timeline(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<TimelineParams>,
) -> ApiResult<Json<PaginatedResponse<TimelineNoteResponse>>> {
    let page = params.page()?;
    let type_ids = params.type_ids()?;

    let query = TimelineQuery {
        user_id: user.id,
        since_ms: window_start_ms(
            now_ms(),
            chrono::Duration::days(state.timeline_window_days),
        ),
        type_ids,
        limit: page.limit(),
        offset: page.offset(),
    };

    let rows = state.note_repository.timeline(&query).await?;

    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(TimelineNoteResponse::from).collect(),
        page,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/timeline",
    tag = "timeline",
    request_body = DeleteTimelineRequest,
    responses(
        (status = 200, description = "Notes removed from the timeline", body = MessageResponse),
        (status = 422, description = "Some notes are not on the caller's timeline", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_from_timeline(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<DeleteTimelineRequest>,
) -> ApiResult<Json<MessageResponse>> {
    request.validate()?;

    // All or nothing: every id must be an active share received by the caller.
    let found: Vec<i64> = state
        .share_repository
        .find_active_received(user.id, &request.notes_ids)
        .await?
        .into_iter()
        .map(|share| share.note_id)
        .collect();

    let missing = unresolved_ids(&request.notes_ids, &found);
    if !missing.is_empty() {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_NOTES",
            "Some notes are not on your timeline",
        )
        .with_details(serde_json::json!({ "notesIds": missing })));
    }

    let removed = state
        .share_repository
        .soft_delete(user.id, &request.notes_ids)
        .await?;
    tracing::info!(user_id = user.id, removed, "Notes removed from timeline");

    Ok(Json(MessageResponse::new("Notes removed from timeline")))
}
