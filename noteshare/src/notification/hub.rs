//! Registry of live socket connections, keyed by user id.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;

/// Frame pushed to a connected client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SocketMessage {
    pub title: String,
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl SocketMessage {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            timestamp: crate::database::time::now_ms(),
        }
    }
}

struct Connection {
    id: u64,
    tx: mpsc::UnboundedSender<SocketMessage>,
}

/// Handle identifying one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketSubscription {
    pub user_id: i64,
    connection_id: u64,
}

/// A user may hold several connections (tabs, devices); pushes fan out to all.
#[derive(Default)]
pub struct SocketHub {
    connections: DashMap<i64, Vec<Connection>>,
    next_id: AtomicU64,
}

impl SocketHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection for `user_id`.
    pub fn register(
        &self,
        user_id: i64,
    ) -> (SocketSubscription, mpsc::UnboundedReceiver<SocketMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections
            .entry(user_id)
            .or_default()
            .push(Connection {
                id: connection_id,
                tx,
            });

        (
            SocketSubscription {
                user_id,
                connection_id,
            },
            rx,
        )
    }

    pub fn unregister(&self, subscription: &SocketSubscription) {
        if let Some(mut conns) = self.connections.get_mut(&subscription.user_id) {
            conns.retain(|c| c.id != subscription.connection_id);
        }
        self.connections
            .remove_if(&subscription.user_id, |_, conns| conns.is_empty());
    }

    /// Push to every live connection of `user_id`; returns how many were reached.
    ///
    /// Connections whose receiver is gone are pruned.
    pub fn push(&self, user_id: i64, message: &SocketMessage) -> usize {
        let reached = match self.connections.get_mut(&user_id) {
            Some(mut conns) => {
                conns.retain(|c| c.tx.send(message.clone()).is_ok());
                conns.len()
            }
            None => 0,
        };
        if reached == 0 {
            self.connections.remove_if(&user_id, |_, conns| conns.is_empty());
        }
        reached
    }

    pub fn is_connected(&self, user_id: i64) -> bool {
        self.connections
            .get(&user_id)
            .is_some_and(|conns| !conns.is_empty())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.iter().map(|entry| entry.len()).sum()
    }
}
