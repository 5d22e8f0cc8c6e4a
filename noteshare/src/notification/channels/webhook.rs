//! Generic webhook notification channel.

use async_trait::async_trait;
use reqwest::{Client, header::HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::NotificationChannel;
use crate::notification::types::{DeliveryReport, NotificationOptions};

/// Webhook channel configuration shared by every target URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// HTTP method (default: POST).
    #[serde(default = "default_method")]
    pub method: String,
    /// Custom headers.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Authentication type.
    pub auth: Option<WebhookAuth>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_timeout() -> u64 {
    10
}

/// Webhook authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebhookAuth {
    /// Bearer token authentication.
    Bearer { token: String },
    /// Basic authentication.
    Basic { username: String, password: String },
    /// Custom header authentication.
    Header { name: String, value: String },
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            headers: Vec::new(),
            auth: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// POSTs `{title, message, timestamp}` to each URL in `webhookOptions.urls`.
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    /// Create a new Webhook channel.
    pub fn new(config: WebhookConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.config.headers {
            if let (Ok(name), Ok(value)) = (
                name.parse::<reqwest::header::HeaderName>(),
                value.parse::<reqwest::header::HeaderValue>(),
            ) {
                headers.insert(name, value);
            }
        }

        match &self.config.auth {
            Some(WebhookAuth::Bearer { token }) => {
                if let Ok(value) = format!("Bearer {}", token).parse() {
                    headers.insert(reqwest::header::AUTHORIZATION, value);
                }
            }
            Some(WebhookAuth::Header { name, value }) => {
                if let (Ok(name), Ok(value)) = (
                    name.parse::<reqwest::header::HeaderName>(),
                    value.parse::<reqwest::header::HeaderValue>(),
                ) {
                    headers.insert(name, value);
                }
            }
            // Basic auth goes through the request builder
            Some(WebhookAuth::Basic { .. }) | None => {}
        }

        headers
    }

    fn build_payload(title: &str, message: &str) -> serde_json::Value {
        json!({
            "title": title,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    }

    async fn post(&self, url: &str, payload: &serde_json::Value) -> crate::Result<()> {
        let url = url::Url::parse(url)
            .map_err(|e| crate::Error::invalid_input("url", format!("{}: {}", url, e)))?;

        let mut request = match self.config.method.to_uppercase().as_str() {
            "PUT" => self.client.put(url),
            _ => self.client.post(url),
        };

        request = request.headers(self.build_headers()).json(payload);

        if let Some(WebhookAuth::Basic { username, password }) = &self.config.auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| crate::Error::Other(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(crate::Error::Other(format!(
                "Webhook failed: {} - {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn channel_type(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(
        &self,
        title: &str,
        message: &str,
        options: &NotificationOptions,
    ) -> DeliveryReport {
        let Some(webhook_options) = &options.webhook_options else {
            return DeliveryReport::skipped(self.channel_type());
        };

        let payload = Self::build_payload(title, message);
        let mut report = DeliveryReport::new(self.channel_type());

        for url in &webhook_options.urls {
            match self.post(url, &payload).await {
                Ok(()) => {
                    debug!("Webhook notification sent to {}", url);
                    report.record_success();
                }
                Err(e) => {
                    warn!("Webhook delivery to {} failed: {}", url, e);
                    report.record_failure(url.as_str(), e);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_config_default() {
        let config = WebhookConfig::default();
        assert_eq!(config.method, "POST");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_build_payload() {
        let payload = WebhookChannel::build_payload("bob sent you a new note", "hi");
        assert_eq!(payload["title"], "bob sent you a new note");
        assert_eq!(payload["message"], "hi");
        assert!(payload["timestamp"].is_string());
    }

    #[test]
    fn test_build_headers_with_bearer() {
        let channel = WebhookChannel::new(WebhookConfig {
            auth: Some(WebhookAuth::Bearer {
                token: "test-token".to_string(),
            }),
            headers: vec![("X-Source".to_string(), "noteshare".to_string())],
            ..Default::default()
        });
        let headers = channel.build_headers();

        assert!(headers.contains_key(reqwest::header::AUTHORIZATION));
        assert_eq!(headers.get("x-source").unwrap(), "noteshare");
    }

    #[tokio::test]
    async fn test_absent_webhook_options_is_noop() {
        let channel = WebhookChannel::new(WebhookConfig::default());
        let report = channel
            .deliver("t", "m", &NotificationOptions::new().with_socket_recipients(vec![1]))
            .await;
        assert!(report.skipped);
        assert_eq!(report.attempted, 0);
    }

    #[tokio::test]
    async fn test_invalid_url_is_recorded_and_others_attempted() {
        let channel = WebhookChannel::new(WebhookConfig {
            timeout_secs: 1,
            ..Default::default()
        });
        let options = NotificationOptions::new()
            .with_webhooks(["not a url", "http://127.0.0.1:1/hook"]);

        let report = channel.deliver("t", "m", &options).await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 0);
        assert_eq!(report.failures[0].target, "not a url");
        assert_eq!(report.failures[1].target, "http://127.0.0.1:1/hook");
    }
}
