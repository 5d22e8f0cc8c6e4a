//! API route modules.
//!
//! Organizes routes by resource type. `/api/auth`, `/api/health` and
//! `/api/ws` are public (the socket authenticates through its query string);
//! everything else sits behind the JWT middleware.

pub mod auth;
pub mod health;
pub mod logging;
pub mod notes;
pub mod timeline;
pub mod ws;

use axum::{Router, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::middleware::jwt_auth_middleware;
use crate::api::openapi::ApiDoc;
use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/notes", notes::router())
        .nest("/api/timeline", timeline::router())
        .nest("/api/logging", logging::router())
        .route_layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/health", health::router())
        .nest("/api/ws", ws::router())
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
}
