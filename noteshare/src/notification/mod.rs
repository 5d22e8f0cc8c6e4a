//! Notification fan-out.
//!
//! A [`Notification`] carries a title, a message and a capability-keyed
//! [`NotificationOptions`] bag. The [`NotificationBroadcaster`] hands it to
//! every registered channel concurrently; each channel acts only on its own
//! key. The [`NotificationDispatcher`] queues notifications so request
//! handlers can fire and forget.
//!
//! ```ignore
//! let broadcaster = Arc::new(
//!     NotificationBroadcaster::builder()
//!         .register(Arc::new(SocketChannel::new(hub)))
//!         .register(Arc::new(EmailChannel::new(Arc::new(LogEmailSender))))
//!         .build(),
//! );
//! let dispatcher = NotificationDispatcher::start(broadcaster, 1024);
//! dispatcher.schedule(Notification::new("title", "message", options));
//! ```

pub mod broadcaster;
pub mod channels;
pub mod dispatcher;
pub mod email;
pub mod hub;
pub mod types;

pub use broadcaster::{BroadcastStats, BroadcastSummary, BroadcasterBuilder, NotificationBroadcaster};
pub use channels::{EmailChannel, NotificationChannel, SocketChannel, WebhookChannel, WebhookConfig};
pub use dispatcher::{NotificationDispatcher, NotificationScheduler};
pub use email::{EmailRelayConfig, EmailSender, HttpEmailSender, LogEmailSender};
pub use hub::{SocketHub, SocketMessage, SocketSubscription};
pub use types::{
    DeliveryFailure, DeliveryReport, EmailOptions, Notification, NotificationOptions,
    SocketOptions, WebhookOptions,
};
