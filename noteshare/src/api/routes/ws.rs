//! Notification WebSocket route.
//!
//! Browsers cannot set headers on a WebSocket handshake, so the JWT travels
//! as `?token=<jwt>`. Each connection is registered on the [`SocketHub`] and
//! receives the caller's notifications as JSON text frames.
//!
//! [`SocketHub`]: crate::notification::SocketHub

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Bytes,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::domain::AuthUser;
use crate::notification::SocketHub;

const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Query parameters for WebSocket connection (JWT token).
#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    pub token: String,
}

/// Create the WebSocket router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(notifications_ws))
}

async fn notifications_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(auth): Query<WsAuthParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .jwt_service
        .authenticate(&auth.token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    let hub = state.socket_hub.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, hub, user)))
}

async fn handle_socket(socket: WebSocket, hub: Arc<SocketHub>, user: AuthUser) {
    let (subscription, mut notifications) = hub.register(user.id);
    info!(user_id = user.id, "Socket connected");

    let (mut sender, mut receiver) = socket.split();
    let mut heartbeat = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
    // The first tick fires immediately.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(user_id = user.id, "WebSocket error: {}", e);
                        break;
                    }
                    // Clients only listen on this socket.
                    Some(Ok(_)) => {}
                }
            }

            notification = notifications.recv() => {
                let Some(notification) = notification else { break };
                let payload = match serde_json::to_string(&notification) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("Failed to encode socket notification: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }

            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    hub.unregister(&subscription);
    info!(user_id = user.id, "Socket disconnected");
}
