//! Notification channels.
//!
//! Each channel inspects only its own key of [`NotificationOptions`]:
//! - Email (per-address relay sends)
//! - Socket (push to connected users)
//! - Generic webhooks (HTTP POST)

mod email;
mod socket;
mod webhook;

pub use email::EmailChannel;
pub use socket::SocketChannel;
pub use webhook::{WebhookAuth, WebhookChannel, WebhookConfig};

use async_trait::async_trait;

use super::types::{DeliveryReport, NotificationOptions};

/// Trait for notification channels.
///
/// Delivery never fails as a whole: per-target failures are logged and
/// collected in the returned report.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Deliver a notification to every target this channel finds in `options`.
    async fn deliver(
        &self,
        title: &str,
        message: &str,
        options: &NotificationOptions,
    ) -> DeliveryReport;
}
