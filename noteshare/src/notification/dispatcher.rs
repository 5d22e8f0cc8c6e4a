//! Deferred, fire-and-forget broadcasting.
//!
//! Callers enqueue a [`Notification`] and return immediately. A single worker
//! drains the queue and runs each broadcast as its own task, so a slow channel
//! never holds up the caller or the next notification.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::broadcaster::{BroadcastSummary, NotificationBroadcaster};
use super::types::Notification;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Accepts notifications for delivery after the current request completes.
pub trait NotificationScheduler: Send + Sync {
    /// Enqueue without waiting. Returns `false` when the notification was dropped.
    fn schedule(&self, notification: Notification) -> bool;
}

/// Bounded queue in front of a [`NotificationBroadcaster`].
pub struct NotificationDispatcher {
    tx: mpsc::Sender<Notification>,
    worker: Mutex<Option<JoinHandle<()>>>,
    cancellation_token: CancellationToken,
}

impl NotificationDispatcher {
    /// Spawn the worker. Must be called from within a tokio runtime.
    pub fn start(broadcaster: Arc<NotificationBroadcaster>, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let cancellation_token = CancellationToken::new();
        let worker = tokio::spawn(run_worker(broadcaster, rx, cancellation_token.clone()));

        info!(queue_capacity, "Notification dispatcher started");

        Self {
            tx,
            worker: Mutex::new(Some(worker)),
            cancellation_token,
        }
    }

    /// Notifications waiting in the queue.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Stop accepting work, deliver what is queued, and wait for in-flight broadcasts.
    pub async fn stop(&self) {
        info!("Stopping notification dispatcher");
        self.cancellation_token.cancel();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            error!("Notification dispatcher worker failed: {}", e);
        }

        info!("Notification dispatcher stopped");
    }
}

impl NotificationScheduler for NotificationDispatcher {
    fn schedule(&self, notification: Notification) -> bool {
        if self.cancellation_token.is_cancelled() {
            warn!(title = %notification.title, "Dispatcher stopped, dropping notification");
            return false;
        }

        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(notification)) => {
                warn!(title = %notification.title, "Notification queue full, dropping notification");
                false
            }
            Err(TrySendError::Closed(notification)) => {
                warn!(title = %notification.title, "Notification queue closed, dropping notification");
                false
            }
        }
    }
}

async fn run_worker(
    broadcaster: Arc<NotificationBroadcaster>,
    mut rx: mpsc::Receiver<Notification>,
    cancellation_token: CancellationToken,
) {
    let mut jobs = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            next = rx.recv() => match next {
                Some(notification) => spawn_broadcast(&mut jobs, &broadcaster, notification),
                None => break,
            },
            Some(result) = jobs.join_next(), if !jobs.is_empty() => log_job_result(result),
        }
    }

    rx.close();
    while let Some(notification) = rx.recv().await {
        spawn_broadcast(&mut jobs, &broadcaster, notification);
    }
    while let Some(result) = jobs.join_next().await {
        log_job_result(result);
    }

    debug!("Notification dispatcher worker exited");
}

fn spawn_broadcast(
    jobs: &mut JoinSet<BroadcastSummary>,
    broadcaster: &Arc<NotificationBroadcaster>,
    notification: Notification,
) {
    let broadcaster = Arc::clone(broadcaster);
    jobs.spawn(async move { broadcaster.broadcast_notification(&notification).await });
}

fn log_job_result(result: Result<BroadcastSummary, JoinError>) {
    match result {
        Ok(summary) if summary.failed() > 0 => warn!(
            delivered = summary.delivered(),
            failed = summary.failed(),
            "Deferred broadcast completed with failures"
        ),
        Ok(summary) => debug!(delivered = summary.delivered(), "Deferred broadcast completed"),
        Err(e) if e.is_panic() => error!("Deferred broadcast panicked: {}", e),
        Err(e) => debug!("Deferred broadcast cancelled: {}", e),
    }
}
