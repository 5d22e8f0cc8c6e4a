//! Process configuration read from the environment (and `.env`, loaded by `main`).
//!
//! Unparseable values fall back to their defaults; only `JWT_SECRET` is required.

use std::str::FromStr;

use crate::digest::DEFAULT_DIGEST_CRON;
use crate::notification::dispatcher::DEFAULT_QUEUE_CAPACITY;
use crate::notification::{EmailRelayConfig, WebhookConfig};
use crate::sharing::ShareServiceConfig;
use crate::sharing::service::{DEFAULT_PREVIEW_CHARS, MIN_PREVIEW_CHARS};
use crate::{Error, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:noteshare.db?mode=rwc";
pub const DEFAULT_TIMELINE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DigestSettings {
    pub enabled: bool,
    pub cron: String,
    pub call_to_action_url: Option<String>,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: DEFAULT_DIGEST_CRON.to_string(),
            call_to_action_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_dir: String,
    pub server: ServerSettings,
    pub jwt: JwtSettings,
    /// `None` means mail is only logged.
    pub email_relay: Option<EmailRelayConfig>,
    pub webhook: WebhookConfig,
    pub notification_queue_capacity: usize,
    pub share: ShareServiceConfig,
    pub timeline_window_days: i64,
    pub digest: DigestSettings,
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    non_empty(lookup, key).and_then(|v| v.trim().parse().ok())
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str| non_empty(&lookup, key);

        let secret = string("JWT_SECRET")
            .ok_or_else(|| Error::config("JWT_SECRET must be set"))?;

        let email_relay = string("EMAIL_RELAY_URL").map(|url| EmailRelayConfig {
            url,
            token: string("EMAIL_RELAY_TOKEN"),
            from_address: string("EMAIL_FROM")
                .unwrap_or_else(|| "noreply@noteshare.local".to_string()),
            timeout_secs: parsed(&lookup, "EMAIL_TIMEOUT_SECS").unwrap_or(10),
        });

        let server_defaults = ServerSettings::default();
        let digest_defaults = DigestSettings::default();

        Ok(Self {
            database_url: string("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            log_dir: string("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            server: ServerSettings {
                bind_address: string("API_BIND_ADDRESS").unwrap_or(server_defaults.bind_address),
                port: parsed(&lookup, "API_PORT").unwrap_or(server_defaults.port),
            },
            jwt: JwtSettings {
                secret,
                issuer: string("JWT_ISSUER").unwrap_or_else(|| "noteshare".to_string()),
                audience: string("JWT_AUDIENCE").unwrap_or_else(|| "noteshare-api".to_string()),
                expiration_secs: parsed(&lookup, "JWT_EXPIRATION_SECS").unwrap_or(86_400),
            },
            email_relay,
            webhook: WebhookConfig {
                timeout_secs: parsed(&lookup, "WEBHOOK_TIMEOUT_SECS").unwrap_or(10),
                ..Default::default()
            },
            notification_queue_capacity: parsed(&lookup, "NOTIFICATION_QUEUE_CAPACITY")
                .filter(|c: &usize| *c > 0)
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            share: ShareServiceConfig {
                preview_chars: parsed(&lookup, "SHARE_PREVIEW_CHARS")
                    .unwrap_or(DEFAULT_PREVIEW_CHARS)
                    .max(MIN_PREVIEW_CHARS),
            },
            timeline_window_days: parsed(&lookup, "TIMELINE_WINDOW_DAYS")
                .filter(|d: &i64| *d > 0)
                .unwrap_or(DEFAULT_TIMELINE_WINDOW_DAYS),
            digest: DigestSettings {
                enabled: parsed(&lookup, "DIGEST_ENABLED").unwrap_or(digest_defaults.enabled),
                cron: string("DIGEST_CRON").unwrap_or(digest_defaults.cron),
                call_to_action_url: string("DIGEST_CALL_TO_ACTION_URL"),
            },
        })
    }
}
