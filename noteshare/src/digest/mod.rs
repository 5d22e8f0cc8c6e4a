//! Daily email digest of notes received.

pub mod service;
pub mod summary;

pub use service::{DigestRunReport, DigestScheduler, DigestService, DEFAULT_DIGEST_CRON, DIGEST_SUBJECT};
pub use summary::{format_stats_message, summarize_user_notes, TypeCount, UserStat};
