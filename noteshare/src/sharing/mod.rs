//! Note sharing.
//!
//! [`ShareValidator`] decides whether a share may proceed; [`ShareService`]
//! persists accepted shares and hands the recipient notification to the
//! dispatcher without waiting for delivery.

pub mod service;
pub mod validator;

pub use service::{ShareOutcome, ShareService, ShareServiceConfig, SHARE_SUCCESS_MESSAGE};
pub use validator::{ShareDecision, ShareRejection, ShareValidator};
