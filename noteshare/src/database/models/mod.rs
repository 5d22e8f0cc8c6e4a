//! Database models for noteshare.
//!
//! These models map directly to the database schema. Timestamps are
//! Unix epoch milliseconds, see [`crate::database::time`].

pub mod note;
pub mod share;
pub mod user;

pub use note::*;
pub use share::*;
pub use user::*;
