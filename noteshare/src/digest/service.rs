//! Daily digest delivery and its cron schedule.

use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::summary::{format_stats_message, summarize_user_notes};
use crate::database::repositories::ShareRepository;
use crate::database::time::{now_ms, window_start_ms};
use crate::notification::EmailSender;
use crate::{Error, Result};

pub const DIGEST_SUBJECT: &str = "Daily Notes Stats";

/// Default schedule: every day at midnight (seconds-resolution cron).
pub const DEFAULT_DIGEST_CRON: &str = "0 0 0 * * *";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DigestRunReport {
    pub users: usize,
    pub sent: usize,
    pub failed: usize,
}

pub struct DigestService {
    shares: Arc<dyn ShareRepository>,
    sender: Arc<dyn EmailSender>,
    call_to_action_url: Option<String>,
}

impl DigestService {
    pub fn new(
        shares: Arc<dyn ShareRepository>,
        sender: Arc<dyn EmailSender>,
        call_to_action_url: Option<String>,
    ) -> Self {
        Self {
            shares,
            sender,
            call_to_action_url,
        }
    }

    /// Email every user who received notes in the last 24 hours.
    pub async fn run_once(&self) -> Result<DigestRunReport> {
        self.run_for_window_ending(now_ms()).await
    }

    pub async fn run_for_window_ending(&self, end_ms: i64) -> Result<DigestRunReport> {
        let since = window_start_ms(end_ms, Duration::days(1));
        let rows = self.shares.summary_since(since).await?;
        let stats = summarize_user_notes(&rows);

        let mut report = DigestRunReport {
            users: stats.len(),
            ..Default::default()
        };

        for stat in &stats {
            let body = format_stats_message(stat, self.call_to_action_url.as_deref());
            // A panicking sender must not take down the scheduler task.
            let outcome = AssertUnwindSafe(self.sender.send(&stat.email, DIGEST_SUBJECT, &body))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => report.sent += 1,
                Ok(Err(e)) => {
                    warn!(user_id = stat.user_id, "Failed to send daily digest: {}", e);
                    report.failed += 1;
                }
                Err(_) => {
                    warn!(user_id = stat.user_id, "Email sender panicked during daily digest");
                    report.failed += 1;
                }
            }
        }

        info!(
            users = report.users,
            sent = report.sent,
            failed = report.failed,
            "Daily digest finished"
        );
        Ok(report)
    }
}

/// Runs the digest on a cron schedule.
pub struct DigestScheduler {
    service: Arc<DigestService>,
    schedule: cron::Schedule,
    cancellation_token: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DigestScheduler {
    pub fn new(service: Arc<DigestService>, expression: &str) -> Result<Self> {
        let schedule = cron::Schedule::from_str(expression)
            .map_err(|e| Error::config(format!("Invalid digest cron '{}': {}", expression, e)))?;

        Ok(Self {
            service,
            schedule,
            cancellation_token: CancellationToken::new(),
            handle: Mutex::new(None),
        })
    }

    /// Start the loop. Returns `false` if it was already started.
    pub fn start(&self) -> bool {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            debug!("Digest scheduler already running");
            return false;
        }

        let service = self.service.clone();
        let schedule = self.schedule.clone();
        let token = self.cancellation_token.clone();

        *handle = Some(tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    warn!("Digest schedule has no upcoming runs, stopping");
                    break;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                debug!(next = %next, "Next daily digest scheduled");

                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(wait) => {}
                }

                if let Err(e) = service.run_once().await {
                    error!("Daily digest failed: {}", e);
                }
            }
        }));

        info!("Digest scheduler started");
        true
    }

    pub async fn stop(&self) {
        self.cancellation_token.cancel();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            error!("Digest scheduler task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repositories::{ShareRepository, SqlxShareRepository};
    use crate::database::test_utils::{insert_note, insert_user, setup_test_pool};
    use crate::notification::email::test_support::RecordingEmailSender;

    #[tokio::test]
    async fn test_run_emails_each_recipient() {
        let pool = setup_test_pool().await;
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;
        let carol = insert_user(&pool, "carol").await;
        let n1 = insert_note(&pool, alice.id, "One", "first note").await;
        let n2 = insert_note(&pool, alice.id, "Two", "second note").await;

        let shares = Arc::new(SqlxShareRepository::new(pool.clone()));
        shares.create_many(n1, &[bob.id, carol.id]).await.unwrap();
        shares.create_many(n2, &[bob.id]).await.unwrap();

        let sender = Arc::new(RecordingEmailSender::failing_for(["carol@example.com"]));
        let service = DigestService::new(shares, sender.clone(), None);

        let report = service.run_once().await.unwrap();

        assert_eq!(
            report,
            DigestRunReport {
                users: 2,
                sent: 1,
                failed: 1
            }
        );
        let sent = sender.sent();
        assert_eq!(sent[0].0, "bob@example.com");
        assert_eq!(sent[0].1, DIGEST_SUBJECT);
        assert!(sent[0].2.starts_with("Hi bob,\nYou got some new notes!\n2 "));
    }

    #[tokio::test]
    async fn test_panicking_sender_does_not_abort_run() {
        let pool = setup_test_pool().await;
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;
        let carol = insert_user(&pool, "carol").await;
        let note = insert_note(&pool, alice.id, "One", "first note").await;

        let shares = Arc::new(SqlxShareRepository::new(pool.clone()));
        shares.create_many(note, &[bob.id, carol.id]).await.unwrap();

        let sender = Arc::new(RecordingEmailSender::panicking_for(["bob@example.com"]));
        let service = DigestService::new(shares, sender.clone(), None);

        let report = service.run_once().await.unwrap();
        assert_eq!(
            report,
            DigestRunReport {
                users: 2,
                sent: 1,
                failed: 1
            }
        );
        assert!(sender.sent().iter().any(|(to, _, _)| to == "carol@example.com"));

        // The service stays usable after a contained panic.
        assert_eq!(service.run_once().await.unwrap().sent, 1);
    }

    #[tokio::test]
    async fn test_soft_deleted_shares_are_not_counted() {
        let pool = setup_test_pool().await;
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;
        let note = insert_note(&pool, alice.id, "One", "first note").await;

        let shares = Arc::new(SqlxShareRepository::new(pool.clone()));
        shares.create_many(note, &[bob.id]).await.unwrap();
        shares.soft_delete(bob.id, &[note]).await.unwrap();

        let sender = Arc::new(RecordingEmailSender::default());
        let report = DigestService::new(shares, sender.clone(), None)
            .run_once()
            .await
            .unwrap();

        assert_eq!(report.users, 0);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_old_shares_fall_outside_window() {
        let pool = setup_test_pool().await;
        let alice = insert_user(&pool, "alice").await;
        let bob = insert_user(&pool, "bob").await;
        let note = insert_note(&pool, alice.id, "One", "first note").await;

        let shares = Arc::new(SqlxShareRepository::new(pool.clone()));
        shares.create_many(note, &[bob.id]).await.unwrap();

        let sender = Arc::new(RecordingEmailSender::default());
        let service = DigestService::new(shares, sender, None);
        let two_days_later = now_ms() + Duration::days(2).num_milliseconds();

        let report = service.run_for_window_ending(two_days_later).await.unwrap();
        assert_eq!(report.users, 0);
    }

    #[tokio::test]
    async fn test_scheduler_start_is_idempotent() {
        let pool = setup_test_pool().await;
        let service = Arc::new(DigestService::new(
            Arc::new(SqlxShareRepository::new(pool)),
            Arc::new(RecordingEmailSender::default()),
            None,
        ));
        let scheduler = DigestScheduler::new(service, DEFAULT_DIGEST_CRON).unwrap();

        assert!(scheduler.start());
        assert!(!scheduler.start());
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_invalid_cron_rejected() {
        let pool = setup_test_pool().await;
        let service = Arc::new(DigestService::new(
            Arc::new(SqlxShareRepository::new(pool)),
            Arc::new(RecordingEmailSender::default()),
            None,
        ));
        let err = DigestScheduler::new(service, "not a cron").err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
