//! Outbound email transport.
//!
//! Mail is handed to an HTTP relay; when no relay is configured the
//! log-only sender records what would have been sent.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Error, Result};

/// Sends a single plain-text email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// HTTP email relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRelayConfig {
    /// Relay endpoint accepting `{from, to, subject, text}`.
    pub url: String,
    /// Bearer token for the relay.
    pub token: Option<String>,
    /// Sender address.
    pub from_address: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

fn check_address(to: &str) -> Result<()> {
    if to.contains('@') && !to.trim().is_empty() {
        Ok(())
    } else {
        Err(Error::invalid_input("to", format!("not an email address: {}", to)))
    }
}

/// Delivers through an HTTP mail relay.
pub struct HttpEmailSender {
    config: EmailRelayConfig,
    client: Client,
}

impl HttpEmailSender {
    pub fn new(config: EmailRelayConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self { config, client }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        check_address(to)?;

        let payload = serde_json::json!({
            "from": self.config.from_address,
            "to": to,
            "subject": subject,
            "text": body,
        });

        let mut request = self.client.post(&self.config.url).json(&payload);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Other(format!("Email relay request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Other(format!(
                "Email relay failed: {} - {}",
                status, body
            )));
        }

        Ok(())
    }
}

/// Records outgoing mail in the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        check_address(to)?;
        info!(
            to = %to,
            subject = %subject,
            body_len = body.len(),
            "Email relay not configured, logging email instead of sending"
        );
        Ok(())
    }
}
