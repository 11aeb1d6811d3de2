//! Common types module for the espeto order service.
//!
//! This module defines the core data types and structures shared by all
//! service components. It provides a centralized location for the domain
//! model, wire formats and configuration validation utilities.

/// API wire types and structured HTTP errors.
pub mod api;
/// Chat message types for the inbound source and outbound sink.
pub mod chat;
/// Order domain types and the lifecycle status enumeration.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Configuration validation types for type-safe TOML configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use chat::*;
pub use order::*;
pub use registry::*;
pub use validation::*;
