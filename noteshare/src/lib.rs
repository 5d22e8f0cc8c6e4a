//! noteshare library crate.
//!
//! A notes backend: users author notes, share them with other users and read
//! the notes shared with them. Sharing fans a notification out over socket,
//! email and webhook channels without blocking the request.

pub mod api;
pub mod config;
pub mod database;
pub mod digest;
pub mod domain;
pub mod error;
pub mod logging;
pub mod notification;
pub mod services;
pub mod sharing;

pub use error::{Error, Result};
