//! API server setup and configuration.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::Request;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::api::auth_service::AuthService;
use crate::api::jwt::JwtService;
use crate::api::routes;
use crate::config::ServerSettings;
use crate::database::repositories::{NoteRepository, ShareRepository, UserRepository};
use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use crate::notification::{NotificationBroadcaster, NotificationDispatcher, SocketHub};
use crate::sharing::ShareService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server start time for uptime calculation
    pub start_time: Instant,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub user_repository: Arc<dyn UserRepository>,
    pub note_repository: Arc<dyn NoteRepository>,
    pub share_repository: Arc<dyn ShareRepository>,
    pub share_service: Arc<ShareService>,
    /// Live socket connections, also the Socket channel's transport
    pub socket_hub: Arc<SocketHub>,
    pub broadcaster: Arc<NotificationBroadcaster>,
    pub dispatcher: Arc<NotificationDispatcher>,
    /// Timeline only shows notes created within this many days
    pub timeline_window_days: i64,
    /// Logging configuration for dynamic log level changes
    pub logging_config: Option<Arc<LoggingConfig>>,
}

impl AppState {
    /// Set the logging configuration.
    pub fn with_logging_config(mut self, config: Arc<LoggingConfig>) -> Self {
        self.logging_config = Some(config);
        self
    }
}

/// API server.
pub struct ApiServer {
    settings: ServerSettings,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    pub fn new(settings: ServerSettings, state: AppState) -> Self {
        Self {
            settings,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Build the router with all middleware and routes.
    pub fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        routes::create_router(self.state.clone())
            .layer(cors)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request| {
                        if req.uri().path().starts_with("/api/health") {
                            Span::none()
                        } else {
                            use tower_http::trace::MakeSpan;
                            tower_http::trace::DefaultMakeSpan::new()
                                .level(tracing::Level::INFO)
                                .make_span(req)
                        }
                    })
                    .on_request(|req: &Request, span: &Span| {
                        if span.is_disabled() {
                            return;
                        }
                        use tower_http::trace::OnRequest;
                        tower_http::trace::DefaultOnRequest::new()
                            .level(tracing::Level::INFO)
                            .on_request(req, span);
                    })
                    .on_response(
                        |res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                            if span.is_disabled() {
                                return;
                            }
                            use tower_http::trace::OnResponse;
                            tower_http::trace::DefaultOnResponse::new()
                                .level(tracing::Level::INFO)
                                .on_response(res, latency, span);
                        },
                    ),
            )
    }

    /// Serve until the cancel token fires.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.settings.bind_address, self.settings.port)
            .parse()
            .map_err(|e| Error::config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("API server listening on http://{}", addr);

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("API server shutting down...");
            })
            .await?;

        Ok(())
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
