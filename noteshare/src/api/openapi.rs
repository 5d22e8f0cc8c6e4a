//! OpenAPI documentation configuration.
//!
//! The document is generated with `utoipa` and served by Swagger UI at
//! `/api/docs`.

use utoipa::OpenApi;

use crate::api::models::{
    CreateNoteRequest, DeleteTimelineRequest, HealthResponse, LoggingFilter, LoginRequest,
    LoginResponse, MessageResponse, NoteResponse, NoteTypeRef, NotificationHealth,
    PaginatedResponse, RegisterRequest, RegisterResponse, SenderRef, ShareNoteRequest,
    TimelineNoteResponse, UserResponse,
};

/// OpenAPI documentation for the noteshare API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "noteshare API",
        description = "Notes backend: author notes, share them with other users and read the notes shared with you."
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "auth", description = "Registration and login"),
        (name = "notes", description = "Note authoring and sharing"),
        (name = "timeline", description = "Notes shared with the caller"),
        (name = "logging", description = "Runtime log filter")
    ),
    paths(
        crate::api::routes::health::health_check,
        crate::api::routes::auth::register,
        crate::api::routes::auth::login,
        crate::api::routes::notes::create_note,
        crate::api::routes::notes::list_notes,
        crate::api::routes::notes::get_note,
        crate::api::routes::notes::share_note,
        crate::api::routes::timeline::get_timeline,
        crate::api::routes::timeline::delete_from_timeline,
        crate::api::routes::logging::get_logging_config,
        crate::api::routes::logging::update_logging_config,
    ),
    components(
        schemas(
            HealthResponse,
            NotificationHealth,
            RegisterRequest,
            RegisterResponse,
            UserResponse,
            LoginRequest,
            LoginResponse,
            MessageResponse,
            crate::api::error::ApiErrorResponse,
            CreateNoteRequest,
            NoteResponse,
            PaginatedResponse<NoteResponse>,
            ShareNoteRequest,
            TimelineNoteResponse,
            NoteTypeRef,
            SenderRef,
            PaginatedResponse<TimelineNoteResponse>,
            DeleteTimelineRequest,
            LoggingFilter,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme addon for Bearer JWT authentication.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
