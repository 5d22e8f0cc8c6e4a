//! REST API server module.
//!
//! Provides HTTP endpoints for registration, note authoring and sharing,
//! the recipient timeline and the notification socket.

pub mod auth_service;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod server;

pub use server::{ApiServer, AppState};
