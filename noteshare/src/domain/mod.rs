//! Domain layer for noteshare.
//!
//! Types shared by the sharing workflow and the HTTP layer.

pub mod identity;

pub use identity::AuthUser;
