//! Service container for dependency injection.
//!
//! The ServiceContainer wires the pool, repositories, notification channels
//! and services together and manages their lifecycle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Result;
use crate::api::auth_service::AuthService;
use crate::api::jwt::JwtService;
use crate::api::server::AppState;
use crate::config::AppConfig;
use crate::database::repositories::{
    NoteRepository, ShareRepository, SqlxNoteRepository, SqlxShareRepository, SqlxUserRepository,
    UserRepository,
};
use crate::digest::{DigestScheduler, DigestService};
use crate::notification::{
    EmailChannel, EmailSender, HttpEmailSender, LogEmailSender, NotificationBroadcaster,
    NotificationDispatcher, SocketChannel, SocketHub, WebhookChannel,
};
use crate::sharing::ShareService;

/// Default shutdown timeout.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Service container holding all application services.
pub struct ServiceContainer {
    /// Database connection pool.
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub user_repository: Arc<dyn UserRepository>,
    pub note_repository: Arc<dyn NoteRepository>,
    pub share_repository: Arc<dyn ShareRepository>,
    pub socket_hub: Arc<SocketHub>,
    pub broadcaster: Arc<NotificationBroadcaster>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub share_service: Arc<ShareService>,
    pub digest_service: Arc<DigestService>,
    /// `None` when the digest is disabled.
    pub digest_scheduler: Option<DigestScheduler>,
    timeline_window_days: i64,
    /// Cancellation token for graceful shutdown.
    cancellation_token: CancellationToken,
}

impl ServiceContainer {
    /// Build every service. Must be called from within a tokio runtime.
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Result<Self> {
        let user_repository: Arc<dyn UserRepository> =
            Arc::new(SqlxUserRepository::new(pool.clone()));
        let note_repository: Arc<dyn NoteRepository> =
            Arc::new(SqlxNoteRepository::new(pool.clone()));
        let share_repository: Arc<dyn ShareRepository> =
            Arc::new(SqlxShareRepository::new(pool.clone()));

        let jwt_service = Arc::new(JwtService::from_settings(&config.jwt));
        let auth_service = Arc::new(AuthService::new(
            user_repository.clone(),
            jwt_service.clone(),
        ));

        let email_sender: Arc<dyn EmailSender> = match &config.email_relay {
            Some(relay) => {
                info!(url = %relay.url, "Sending mail through HTTP relay");
                Arc::new(HttpEmailSender::new(relay.clone()))
            }
            None => {
                warn!("EMAIL_RELAY_URL not set, outgoing mail will only be logged");
                Arc::new(LogEmailSender)
            }
        };

        let socket_hub = Arc::new(SocketHub::new());
        let broadcaster = Arc::new(
            NotificationBroadcaster::builder()
                .register(Arc::new(SocketChannel::new(socket_hub.clone())))
                .register(Arc::new(EmailChannel::new(email_sender.clone())))
                .register(Arc::new(WebhookChannel::new(config.webhook.clone())))
                .build(),
        );
        let dispatcher = Arc::new(NotificationDispatcher::start(
            broadcaster.clone(),
            config.notification_queue_capacity,
        ));

        let share_service = Arc::new(ShareService::new(
            user_repository.clone(),
            note_repository.clone(),
            share_repository.clone(),
            dispatcher.clone(),
            config.share.clone(),
        ));

        let digest_service = Arc::new(DigestService::new(
            share_repository.clone(),
            email_sender,
            config.digest.call_to_action_url.clone(),
        ));
        let digest_scheduler = if config.digest.enabled {
            Some(DigestScheduler::new(
                digest_service.clone(),
                &config.digest.cron,
            )?)
        } else {
            info!("Daily digest disabled");
            None
        };

        Ok(Self {
            pool,
            jwt_service,
            auth_service,
            user_repository,
            note_repository,
            share_repository,
            socket_hub,
            broadcaster,
            dispatcher,
            share_service,
            digest_service,
            digest_scheduler,
            timeline_window_days: config.timeline_window_days,
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Start scheduled background work.
    pub fn start_background(&self) {
        if let Some(scheduler) = &self.digest_scheduler {
            scheduler.start();
        }
    }

    /// State handed to the HTTP layer.
    pub fn app_state(&self) -> AppState {
        AppState {
            start_time: Instant::now(),
            jwt_service: self.jwt_service.clone(),
            auth_service: self.auth_service.clone(),
            user_repository: self.user_repository.clone(),
            note_repository: self.note_repository.clone(),
            share_repository: self.share_repository.clone(),
            share_service: self.share_service.clone(),
            socket_hub: self.socket_hub.clone(),
            broadcaster: self.broadcaster.clone(),
            dispatcher: self.dispatcher.clone(),
            timeline_window_days: self.timeline_window_days,
            logging_config: None,
        }
    }

    /// Shutdown all services gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Shutdown all services gracefully with a custom timeout.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<()> {
        info!("Shutting down services (timeout: {:?})", timeout);

        // Signal all background tasks to stop
        self.cancellation_token.cancel();

        let stopped = tokio::time::timeout(timeout, async {
            if let Some(scheduler) = &self.digest_scheduler {
                scheduler.stop().await;
            }
            // Queued notifications are still delivered before the pool closes.
            self.dispatcher.stop().await;
        })
        .await;

        if stopped.is_err() {
            warn!("Shutdown timeout reached, forcing shutdown");
        }

        info!("Closing database pool...");
        self.pool.close().await;

        info!("Services shut down");
        Ok(())
    }

    /// Get the cancellation token for external use.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}
