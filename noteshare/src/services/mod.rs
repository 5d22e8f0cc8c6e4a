//! Service layer module.
//!
//! This module provides the service container that wires every component.

pub mod container;

pub use container::ServiceContainer;
