//! In-memory store backend for the order service.
//!
//! Orders are deliberately ephemeral: the system of record lives in process
//! memory and is lost on restart. This implementation is the production
//! default and also serves tests.

use crate::{StoreError, StoreInterface};
use async_trait::async_trait;
use espeto_types::{ConfigSchema, ImplementationRegistry, Order, Schema, ValidationError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory store implementation.
///
/// Keeps orders in a HashMap keyed by customer identifier behind a
/// read-write lock. Point reads take the read lock; every write replaces the
/// customer's single entry.
pub struct MemoryStore {
	/// The in-memory map protected by a read-write lock.
	orders: Arc<RwLock<HashMap<String, Order>>>,
}

impl MemoryStore {
	/// Creates a new empty MemoryStore instance.
	pub fn new() -> Self {
		Self {
			orders: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StoreInterface for MemoryStore {
	async fn insert(&self, order: Order) -> Result<(), StoreError> {
		let mut orders = self.orders.write().await;
		orders.insert(order.customer.clone(), order);
		Ok(())
	}

	async fn get(&self, customer: &str) -> Result<Order, StoreError> {
		let orders = self.orders.read().await;
		orders.get(customer).cloned().ok_or(StoreError::NotFound)
	}

	async fn delete(&self, customer: &str) -> Result<(), StoreError> {
		let mut orders = self.orders.write().await;
		orders.remove(customer);
		Ok(())
	}

	async fn find_by_code(&self, code: &str) -> Result<Order, StoreError> {
		let orders = self.orders.read().await;
		orders
			.values()
			.find(|order| order.code == code)
			.cloned()
			.ok_or(StoreError::NotFound)
	}

	async fn all(&self) -> Result<Vec<Order>, StoreError> {
		let orders = self.orders.read().await;
		Ok(orders.values().cloned().collect())
	}

	async fn count(&self) -> Result<usize, StoreError> {
		let orders = self.orders.read().await;
		Ok(orders.len())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStoreSchema)
	}
}

/// Configuration schema for MemoryStore.
pub struct MemoryStoreSchema;

impl ConfigSchema for MemoryStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory store has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Registry entry for the memory store.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl crate::StoreRegistry for Registry {}

/// Factory function to create a memory store from configuration.
///
/// Configuration parameters: none required.
pub fn create_store(_config: &toml::Value) -> Result<Box<dyn StoreInterface>, StoreError> {
	Ok(Box::new(MemoryStore::new()))
}
