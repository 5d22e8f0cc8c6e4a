//! Socket push channel.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::NotificationChannel;
use crate::notification::hub::{SocketHub, SocketMessage};
use crate::notification::types::{DeliveryReport, NotificationOptions};

/// Pushes `{title, message}` to each user in `socketOptions.recipientIds`.
///
/// Without a hub the channel fails soft: targets are reported as failures
/// and nothing is raised.
pub struct SocketChannel {
    hub: Option<Arc<SocketHub>>,
}

impl SocketChannel {
    pub fn new(hub: Arc<SocketHub>) -> Self {
        Self { hub: Some(hub) }
    }

    /// A channel with no push transport behind it.
    pub fn unavailable() -> Self {
        Self { hub: None }
    }
}

#[async_trait]
impl NotificationChannel for SocketChannel {
    fn channel_type(&self) -> &'static str {
        "socket"
    }

    async fn deliver(
        &self,
        title: &str,
        message: &str,
        options: &NotificationOptions,
    ) -> DeliveryReport {
        let Some(socket_options) = &options.socket_options else {
            return DeliveryReport::skipped(self.channel_type());
        };

        let mut report = DeliveryReport::new(self.channel_type());

        let Some(hub) = &self.hub else {
            warn!(
                "Socket transport unavailable, dropping push for {} recipients",
                socket_options.recipient_ids.len()
            );
            for id in &socket_options.recipient_ids {
                report.record_failure(id.to_string(), "socket transport unavailable");
            }
            return report;
        };

        let payload = SocketMessage::new(title, message);
        for &user_id in &socket_options.recipient_ids {
            let reached = hub.push(user_id, &payload);
            if reached > 0 {
                debug!("Pushed notification to user {} ({} connections)", user_id, reached);
                report.record_success();
            } else {
                debug!("User {} has no active socket connection", user_id);
                report.record_failure(user_id.to_string(), "no active socket connection");
            }
        }

        report
    }
}
