//! Fan-out of one notification to every registered channel.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info};

use super::channels::NotificationChannel;
use super::types::{DeliveryReport, Notification, NotificationOptions};

/// Collects channels before the broadcaster is frozen.
#[derive(Default)]
pub struct BroadcasterBuilder {
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl BroadcasterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel. Registration order is the report order.
    pub fn register(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn build(self) -> NotificationBroadcaster {
        info!(
            channels = ?self.channels.iter().map(|c| c.channel_type()).collect::<Vec<_>>(),
            "Notification broadcaster ready"
        );
        NotificationBroadcaster {
            channels: self.channels,
            broadcasts: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            channel_panics: AtomicU64::new(0),
        }
    }
}

/// Reports from every channel for one broadcast, in registration order.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastSummary {
    pub reports: Vec<DeliveryReport>,
}

impl BroadcastSummary {
    pub fn delivered(&self) -> usize {
        self.reports.iter().map(|r| r.delivered).sum()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().map(|r| r.failures.len()).sum()
    }

    pub fn report_for(&self, channel: &str) -> Option<&DeliveryReport> {
        self.reports.iter().find(|r| r.channel == channel)
    }
}

/// Counters since startup.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BroadcastStats {
    pub channel_count: usize,
    pub broadcasts: u64,
    pub delivered: u64,
    pub failed: u64,
    pub channel_panics: u64,
}

/// Fixed set of channels, invoked concurrently on each broadcast.
///
/// A channel failing, or panicking, never affects the others and never
/// surfaces to the caller.
pub struct NotificationBroadcaster {
    channels: Vec<Arc<dyn NotificationChannel>>,
    broadcasts: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    channel_panics: AtomicU64,
}

impl NotificationBroadcaster {
    pub fn builder() -> BroadcasterBuilder {
        BroadcasterBuilder::new()
    }

    pub async fn broadcast(
        &self,
        title: &str,
        message: &str,
        options: &NotificationOptions,
    ) -> BroadcastSummary {
        let deliveries = self.channels.iter().map(|channel| async move {
            let channel_type = channel.channel_type();
            match AssertUnwindSafe(channel.deliver(title, message, options))
                .catch_unwind()
                .await
            {
                Ok(report) => report,
                Err(_) => {
                    error!(channel = channel_type, "Notification channel panicked");
                    self.channel_panics.fetch_add(1, Ordering::Relaxed);
                    DeliveryReport::aborted(channel_type, "channel panicked")
                }
            }
        });

        let summary = BroadcastSummary {
            reports: join_all(deliveries).await,
        };

        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.delivered
            .fetch_add(summary.delivered() as u64, Ordering::Relaxed);
        self.failed
            .fetch_add(summary.failed() as u64, Ordering::Relaxed);

        debug!(
            title = %title,
            delivered = summary.delivered(),
            failed = summary.failed(),
            "Broadcast finished"
        );

        summary
    }

    pub async fn broadcast_notification(&self, notification: &Notification) -> BroadcastSummary {
        self.broadcast(
            &notification.title,
            &notification.message,
            &notification.options,
        )
        .await
    }

    pub fn channel_types(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.channel_type()).collect()
    }

    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            channel_count: self.channels.len(),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            channel_panics: self.channel_panics.load(Ordering::Relaxed),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{PanickingChannel, RecordingChannel};
    use super::*;
    use crate::notification::channels::{EmailChannel, SocketChannel, WebhookChannel, WebhookConfig};
    use crate::notification::email::test_support::RecordingEmailSender;
    use crate::notification::hub::SocketHub;

    #[tokio::test]
    async fn test_every_channel_invoked_once() {
        let a = Arc::new(RecordingChannel::new("a"));
        let b = Arc::new(RecordingChannel::new("b"));
        let broadcaster = NotificationBroadcaster::builder()
            .register(a.clone())
            .register(b.clone())
            .build();

        let summary = broadcaster
            .broadcast("t", "m", &NotificationOptions::new())
            .await;

        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        assert_eq!(
            summary.reports.iter().map(|r| r.channel).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[tokio::test]
    async fn test_panicking_channel_is_isolated() {
        let after = Arc::new(RecordingChannel::new("after"));
        let broadcaster = NotificationBroadcaster::builder()
            .register(Arc::new(PanickingChannel))
            .register(after.clone())
            .build();

        let summary = broadcaster
            .broadcast("t", "m", &NotificationOptions::new())
            .await;

        assert_eq!(after.call_count(), 1);
        assert!(!summary.report_for("panicking").unwrap().is_success());
        assert_eq!(broadcaster.stats().channel_panics, 1);
    }

    #[tokio::test]
    async fn test_email_only_options_leave_other_channels_idle() {
        let sender = Arc::new(RecordingEmailSender::default());
        let hub = Arc::new(SocketHub::new());
        let (_sub, mut rx) = hub.register(1);
        let broadcaster = NotificationBroadcaster::builder()
            .register(Arc::new(SocketChannel::new(hub)))
            .register(Arc::new(EmailChannel::new(sender.clone())))
            .register(Arc::new(WebhookChannel::new(WebhookConfig::default())))
            .build();
        let options = NotificationOptions::new().with_emails(["a@x.io", "b@x.io"]);

        let summary = broadcaster.broadcast("Daily", "stats", &options).await;

        assert_eq!(sender.recipients().len(), 2);
        assert!(summary.report_for("socket").unwrap().skipped);
        assert!(summary.report_for("webhook").unwrap().skipped);
        assert!(rx.try_recv().is_err());
        assert_eq!(summary.delivered(), 2);
    }

    #[tokio::test]
    async fn test_stats_accumulate() {
        let broadcaster = NotificationBroadcaster::builder()
            .register(Arc::new(RecordingChannel::new("a")))
            .build();

        broadcaster.broadcast("t", "m", &NotificationOptions::new()).await;
        broadcaster.broadcast("t", "m", &NotificationOptions::new()).await;

        let stats = broadcaster.stats();
        assert_eq!(stats.channel_count, 1);
        assert_eq!(stats.broadcasts, 2);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.failed, 0);
    }
}
