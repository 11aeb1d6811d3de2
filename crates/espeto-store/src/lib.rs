//! Order store module for the espeto order service.
//!
//! This module provides the abstraction over the system of record for active
//! orders. The store maps a customer identifier to that customer's single
//! active order; keying by customer is what enforces the one-active-order
//! invariant. Backends are pluggable so the in-memory store can be swapped
//! for a persistent one without touching the engine.

use async_trait::async_trait;
use espeto_types::{ConfigSchema, ImplementationRegistry, Order};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
	/// No order exists for the requested customer or code.
	#[error("Not found")]
	NotFound,
	/// Error in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for order store backends.
///
/// All operations are keyed by the customer identifier except
/// [`find_by_code`](StoreInterface::find_by_code), which scans. Statuses are
/// written by storing the whole order; the engine owns transition rules and
/// serializes its read-modify-write sequences.
#[async_trait]
pub trait StoreInterface: Send + Sync {
	/// Inserts or replaces the order kept for its customer.
	async fn insert(&self, order: Order) -> Result<(), StoreError>;

	/// Retrieves the order for the given customer.
	async fn get(&self, customer: &str) -> Result<Order, StoreError>;

	/// Removes the order for the given customer.
	///
	/// Removing an absent entry is not an error.
	async fn delete(&self, customer: &str) -> Result<(), StoreError>;

	/// Finds an order by its code. Linear scan, O(active orders).
	async fn find_by_code(&self, code: &str) -> Result<Order, StoreError>;

	/// Returns a snapshot of all stored orders.
	async fn all(&self) -> Result<Vec<Order>, StoreError>;

	/// Returns the number of stored orders.
	async fn count(&self) -> Result<usize, StoreError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for store factory functions.
///
/// This is the function signature that all store implementations must provide
/// to create instances of their store interface.
pub type StoreFactory = fn(&toml::Value) -> Result<Box<dyn StoreInterface>, StoreError>;

/// Registry trait for store implementations.
pub trait StoreRegistry: ImplementationRegistry<Factory = StoreFactory> {}

/// Get all registered store implementations.
///
/// Returns a vector of (name, factory) tuples for all available store
/// implementations, used by the service wiring to register everything.
pub fn get_all_implementations() -> Vec<(&'static str, StoreFactory)> {
	use implementations::memory;

	vec![(memory::Registry::NAME, memory::Registry::factory())]
}
