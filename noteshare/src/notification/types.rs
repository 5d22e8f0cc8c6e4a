//! Notification values passed to channels.

use serde::{Deserialize, Serialize};

/// Email delivery targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmailOptions {
    pub recipient_emails: Vec<String>,
}

/// Socket push targets (user ids).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SocketOptions {
    pub recipient_ids: Vec<i64>,
}

/// Webhook delivery targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookOptions {
    pub urls: Vec<String>,
}

/// Capability-keyed bag of delivery options.
///
/// A channel only acts when its own key is present; an absent key means the
/// notification is not meant for that channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_options: Option<EmailOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_options: Option<SocketOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_options: Option<WebhookOptions>,
}

impl NotificationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emails<I, S>(mut self, recipient_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.email_options = Some(EmailOptions {
            recipient_emails: recipient_emails.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_socket_recipients(mut self, recipient_ids: Vec<i64>) -> Self {
        self.socket_options = Some(SocketOptions { recipient_ids });
        self
    }

    pub fn with_webhooks<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.webhook_options = Some(WebhookOptions {
            urls: urls.into_iter().map(Into::into).collect(),
        });
        self
    }
}

/// A notification waiting to be broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub options: NotificationOptions,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        options: NotificationOptions,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            options,
        }
    }
}

/// One target a channel could not reach.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Email address, user id or URL.
    pub target: String,
    pub error: String,
}

/// Outcome of one channel's delivery attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeliveryReport {
    pub channel: &'static str,
    /// The notification carried no options for this channel.
    pub skipped: bool,
    pub attempted: usize,
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    /// Start an empty report for `channel`.
    pub fn new(channel: &'static str) -> Self {
        Self {
            channel,
            skipped: false,
            attempted: 0,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    /// The channel had nothing to do.
    pub fn skipped(channel: &'static str) -> Self {
        Self {
            skipped: true,
            ..Self::new(channel)
        }
    }

    /// The channel aborted abnormally; nothing is known to have been delivered.
    pub fn aborted(channel: &'static str, error: impl Into<String>) -> Self {
        let mut report = Self::new(channel);
        report.failures.push(DeliveryFailure {
            target: "*".to_string(),
            error: error.into(),
        });
        report
    }

    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.delivered += 1;
    }

    pub fn record_failure(&mut self, target: impl Into<String>, error: impl ToString) {
        self.attempted += 1;
        self.failures.push(DeliveryFailure {
            target: target.into(),
            error: error.to_string(),
        });
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
