//! Note routes: authoring, listing and sharing.

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{
    CreateNoteRequest, MessageResponse, NOTES_PAGE_SIZE, NoteResponse, PaginatedResponse,
    PaginationParams, ShareNoteRequest,
};
use crate::api::server::AppState;
use crate::database::models::NewNote;
use crate::domain::AuthUser;
use crate::sharing::{SHARE_SUCCESS_MESSAGE, ShareOutcome};

/// Create the notes router. Every route expects an [`AuthUser`] extension.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_note).get(list_notes))
        .route("/{id}", get(get_note))
        .route("/{id}/share", post(share_note))
}

#[utoipa::path(
    post,
    path = "/api/notes",
    tag = "notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteResponse),
        (status = 400, description = "Malformed input", body = crate::api::error::ApiErrorResponse),
        (status = 404, description = "Note type not found", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<NoteResponse>)> {
    request.validate()?;

    if state
        .note_repository
        .find_type_by_id(request.type_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(format!(
            "Note type with id '{}' not found",
            request.type_id
        )));
    }

    let note = state
        .note_repository
        .create(&NewNote {
            sender_id: user.id,
            title: request.title.trim().to_string(),
            message: request.content,
            type_id: request.type_id,
        })
        .await?;

    tracing::info!(note_id = note.id, sender_id = user.id, "Note created");
    Ok((StatusCode::CREATED, Json(note.into())))
}

#[utoipa::path(
    get,
    path = "/api/notes",
    tag = "notes",
    params(PaginationParams),
    responses(
        (status = 200, description = "Notes authored by the caller", body = PaginatedResponse<NoteResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<PaginatedResponse<NoteResponse>>> {
    let page = pagination.resolve(NOTES_PAGE_SIZE)?;

    let notes = state
        .note_repository
        .list_by_sender(user.id, page.limit(), page.offset())
        .await?;

    Ok(Json(PaginatedResponse::new(
        notes.into_iter().map(NoteResponse::from).collect(),
        page,
    )))
}

/// A note is visible to its sender and to recipients holding an active share.
#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    tag = "notes",
    params(("id" = i64, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note", body = NoteResponse),
        (status = 404, description = "Note not found", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<NoteResponse>> {
    let not_found = || ApiError::not_found(format!("Note with id '{}' not found", id));

    let note = state
        .note_repository
        .get_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    if !note.is_owned_by(user.id)
        && state
            .share_repository
            .find_active_received(user.id, &[id])
            .await?
            .is_empty()
    {
        return Err(not_found());
    }

    Ok(Json(note.into()))
}

#[utoipa::path(
    post,
    path = "/api/notes/{id}/share",
    tag = "notes",
    params(("id" = i64, Path, description = "Note ID")),
    request_body = ShareNoteRequest,
    responses(
        (status = 200, description = "Note shared", body = MessageResponse),
        (status = 400, description = "Malformed input", body = crate::api::error::ApiErrorResponse),
        (status = 401, description = "Caller is not the sender of the note", body = crate::api::error::ApiErrorResponse),
        (status = 404, description = "Note not found", body = crate::api::error::ApiErrorResponse),
        (status = 422, description = "Share rejected", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn share_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(request): Json<ShareNoteRequest>,
) -> ApiResult<Json<MessageResponse>> {
    request.validate()?;

    match state
        .share_service
        .share_note_by_id(&user, id, &request.recipient_ids)
        .await?
    {
        ShareOutcome::Shared { .. } => Ok(Json(MessageResponse::new(SHARE_SUCCESS_MESSAGE))),
        ShareOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}
