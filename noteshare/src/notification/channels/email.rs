//! Email notification channel.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, warn};

use super::NotificationChannel;
use crate::notification::email::EmailSender;
use crate::notification::types::{DeliveryReport, NotificationOptions};

/// Sends one email per address in `emailOptions.recipientEmails`.
pub struct EmailChannel {
    sender: Arc<dyn EmailSender>,
}

impl EmailChannel {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn channel_type(&self) -> &'static str {
        "email"
    }

    async fn deliver(
        &self,
        title: &str,
        message: &str,
        options: &NotificationOptions,
    ) -> DeliveryReport {
        let Some(email_options) = &options.email_options else {
            return DeliveryReport::skipped(self.channel_type());
        };

        let mut report = DeliveryReport::new(self.channel_type());
        for address in &email_options.recipient_emails {
            // A failing (or panicking) send must not stop the remaining addresses.
            let outcome = AssertUnwindSafe(self.sender.send(address, title, message))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {
                    debug!("Email notification sent to {}", address);
                    report.record_success();
                }
                Ok(Err(e)) => {
                    warn!("Failed to send email to {}: {}", address, e);
                    report.record_failure(address.as_str(), e);
                }
                Err(_) => {
                    warn!("Email sender panicked while sending to {}", address);
                    report.record_failure(address.as_str(), "email sender panicked");
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::email::test_support::RecordingEmailSender;

    #[tokio::test]
    async fn test_sends_once_per_address_despite_failure() {
        let sender = Arc::new(RecordingEmailSender::failing_for(["b@x.io"]));
        let channel = EmailChannel::new(sender.clone());
        let options = NotificationOptions::new().with_emails(["a@x.io", "b@x.io", "c@x.io"]);

        let report = channel.deliver("Daily", "body", &options).await;

        assert_eq!(
            sender.recipients(),
            vec!["a@x.io".to_string(), "b@x.io".to_string(), "c@x.io".to_string()]
        );
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].target, "b@x.io");
    }

    #[tokio::test]
    async fn test_absent_email_options_is_noop() {
        let sender = Arc::new(RecordingEmailSender::default());
        let channel = EmailChannel::new(sender.clone());
        let options = NotificationOptions::new().with_socket_recipients(vec![1]);

        let report = channel.deliver("t", "m", &options).await;

        assert!(report.skipped);
        assert!(sender.recipients().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_sender_is_contained() {
        let sender = Arc::new(RecordingEmailSender::panicking_for(["boom@x.io"]));
        let channel = EmailChannel::new(sender.clone());
        let options = NotificationOptions::new().with_emails(["boom@x.io", "ok@x.io"]);

        let report = channel.deliver("t", "m", &options).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failures[0].error, "email sender panicked");
    }
}
