//! Order lifecycle engine.
//!
//! The engine owns every mutation of the order store: creation with the
//! per-customer limit, chat-driven confirmation and cancellation, operator
//! status updates and the expiry sweep. Check-then-act sequences run under a
//! single mutation lock so concurrent triggers (chat, HTTP, sweeper) cannot
//! lose updates; the lock is never held across notification I/O.

use crate::codegen::OrderCodeGenerator;
use crate::lifecycle::is_valid_transition;
use crate::replies::Replies;
use espeto_store::{StoreError, StoreInterface};
use espeto_types::{Order, OrderStats, OrderStatus};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	/// No order exists for the customer, or the code does not match.
	#[error("Order not found")]
	NotFound,
	/// The customer already holds the maximum number of active orders.
	#[error("Active order limit reached ({limit})")]
	LimitExceeded { limit: usize },
	/// The order is past the confirmable state.
	#[error("Order already confirmed")]
	AlreadyConfirmed,
	/// The order is finalized and can no longer be cancelled.
	#[error("Order already finalized")]
	AlreadyFinalized,
	/// The requested status is not in the known enumeration.
	#[error("Invalid status: {0}")]
	InvalidStatus(String),
	/// Error from the order store.
	#[error("Store error: {0}")]
	Store(String),
}

impl EngineError {
	fn from_store(err: StoreError) -> Self {
		match err {
			StoreError::NotFound => EngineError::NotFound,
			other => EngineError::Store(other.to_string()),
		}
	}
}

/// Lifecycle parameters the engine operates under.
#[derive(Debug, Clone)]
pub struct EngineSettings {
	/// Maximum active (non-cancelled) orders per customer.
	pub max_active_per_customer: usize,
	/// Inactivity window after which an order expires.
	pub timeout: Duration,
}

impl From<&espeto_config::OrdersConfig> for EngineSettings {
	fn from(config: &espeto_config::OrdersConfig) -> Self {
		Self {
			max_active_per_customer: config.max_active_per_customer,
			timeout: Duration::from_secs(config.timeout_minutes * 60),
		}
	}
}

/// Result of an operator status update.
#[derive(Debug)]
pub struct StatusChange {
	/// Status the operator asked for.
	pub requested: OrderStatus,
	/// Status actually applied. `Finalizado` when the request was `entregue`
	/// and the order was removed in the same operation.
	pub effective: OrderStatus,
	/// Customer notification selected by the requested status, if any.
	pub notification: Option<String>,
}

/// Returns the current Unix time in seconds, 0 before the epoch.
pub fn now_secs() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

/// The order lifecycle engine.
///
/// Holds the injectable store, the lifecycle settings and the reply
/// templates. All state transitions go through here; no other component
/// writes order statuses.
pub struct Engine {
	/// System of record for active orders.
	store: Arc<dyn StoreInterface>,
	/// Lifecycle parameters.
	settings: EngineSettings,
	/// Reply and notification templates.
	replies: Replies,
	/// Order code generator.
	codegen: OrderCodeGenerator,
	/// Serializes check-then-act sequences across chat, HTTP and the sweeper.
	mutation: Mutex<()>,
}

impl Engine {
	/// Creates a new engine over the given store.
	pub fn new(store: Arc<dyn StoreInterface>, settings: EngineSettings, replies: Replies) -> Self {
		Self {
			store,
			settings,
			replies,
			codegen: OrderCodeGenerator::new(),
			mutation: Mutex::new(()),
		}
	}

	/// Returns the reply templates.
	pub fn replies(&self) -> &Replies {
		&self.replies
	}

	/// Creates a new order for the customer and returns its code.
	///
	/// Fails with [`EngineError::LimitExceeded`] once the customer holds the
	/// configured number of active (non-cancelled) orders.
	pub async fn create_order(&self, customer: &str, raw_text: &str) -> Result<String, EngineError> {
		let _guard = self.mutation.lock().await;

		let active = self
			.store
			.all()
			.await
			.map_err(EngineError::from_store)?
			.into_iter()
			.filter(|order| order.customer == customer && order.status != OrderStatus::Cancelado)
			.count();

		if active >= self.settings.max_active_per_customer {
			return Err(EngineError::LimitExceeded {
				limit: self.settings.max_active_per_customer,
			});
		}

		let code = self.codegen.next_code();
		let order = Order {
			code: code.clone(),
			customer: customer.to_string(),
			status: OrderStatus::Iniciado,
			created_at: now_secs(),
			raw_text: raw_text.to_string(),
		};

		self.store
			.insert(order)
			.await
			.map_err(EngineError::from_store)?;

		tracing::info!(customer, code = %code, "New order received");
		Ok(code)
	}

	/// Confirms the customer's pending order and returns it.
	///
	/// Only an `iniciado` order can be confirmed; anything later is reported
	/// as [`EngineError::AlreadyConfirmed`].
	pub async fn confirm(&self, customer: &str) -> Result<Order, EngineError> {
		let _guard = self.mutation.lock().await;

		let mut order = self
			.store
			.get(customer)
			.await
			.map_err(EngineError::from_store)?;

		if !is_valid_transition(&order.status, &OrderStatus::Confirmado) {
			return Err(EngineError::AlreadyConfirmed);
		}

		order.status = OrderStatus::Confirmado;
		self.store
			.insert(order.clone())
			.await
			.map_err(EngineError::from_store)?;

		tracing::info!(customer, code = %order.code, "Order confirmed");
		Ok(order)
	}

	/// Cancels the customer's order and removes it from the store.
	pub async fn cancel(&self, customer: &str) -> Result<(), EngineError> {
		let _guard = self.mutation.lock().await;

		let order = self
			.store
			.get(customer)
			.await
			.map_err(EngineError::from_store)?;

		if !is_valid_transition(&order.status, &OrderStatus::Cancelado) {
			return Err(EngineError::AlreadyFinalized);
		}

		self.store
			.delete(customer)
			.await
			.map_err(EngineError::from_store)?;

		tracing::info!(customer, code = %order.code, "Order cancelled");
		Ok(())
	}

	/// Returns the customer's current order.
	pub async fn status_of(&self, customer: &str) -> Result<Order, EngineError> {
		self.store
			.get(customer)
			.await
			.map_err(EngineError::from_store)
	}

	/// Applies an operator status update.
	///
	/// Requires an exact match of both customer and code so a stale dashboard
	/// cannot touch a different order; a mismatch leaves the store untouched.
	/// The operator path deliberately skips the lifecycle table: concurrent
	/// updates resolve last-write-wins. A request for `entregue` finalizes
	/// the order and removes it in the same operation.
	pub async fn set_status(
		&self,
		customer: &str,
		code: &str,
		new_status: &str,
	) -> Result<StatusChange, EngineError> {
		let requested = OrderStatus::from_str(new_status)
			.map_err(|_| EngineError::InvalidStatus(new_status.to_string()))?;

		let _guard = self.mutation.lock().await;

		let mut order = self
			.store
			.get(customer)
			.await
			.map_err(EngineError::from_store)?;

		if order.code != code {
			return Err(EngineError::NotFound);
		}

		let previous = order.status;
		let effective = if requested == OrderStatus::Entregue {
			// Delivered orders finalize immediately and are not retained
			self.store
				.delete(customer)
				.await
				.map_err(EngineError::from_store)?;
			OrderStatus::Finalizado
		} else {
			order.status = requested;
			self.store
				.insert(order)
				.await
				.map_err(EngineError::from_store)?;
			requested
		};

		tracing::info!(
			customer,
			code,
			from = %previous,
			to = %requested,
			"Order status updated"
		);

		Ok(StatusChange {
			requested,
			effective,
			notification: self.replies.notification_for(requested),
		})
	}

	/// Returns all active orders, oldest first.
	pub async fn list_orders(&self) -> Result<Vec<Order>, EngineError> {
		let mut orders = self.store.all().await.map_err(EngineError::from_store)?;
		orders.sort_by_key(|order| order.created_at);
		Ok(orders)
	}

	/// Finds an active order by its code.
	pub async fn find_by_code(&self, code: &str) -> Result<Order, EngineError> {
		self.store
			.find_by_code(code)
			.await
			.map_err(EngineError::from_store)
	}

	/// Returns the number of active orders.
	pub async fn active_count(&self) -> Result<usize, EngineError> {
		self.store.count().await.map_err(EngineError::from_store)
	}

	/// Computes aggregate statistics over the active orders.
	pub async fn stats(&self) -> Result<OrderStats, EngineError> {
		let orders = self.store.all().await.map_err(EngineError::from_store)?;
		let one_hour_ago = now_secs().saturating_sub(3600);

		let mut por_status: BTreeMap<OrderStatus, usize> = BTreeMap::new();
		let mut ultima_hora = 0;
		for order in &orders {
			*por_status.entry(order.status).or_insert(0) += 1;
			if order.created_at > one_hour_ago {
				ultima_hora += 1;
			}
		}

		Ok(OrderStats {
			total_pedidos: orders.len(),
			por_status,
			ultima_hora,
		})
	}

	/// Removes every order idle past the timeout window.
	///
	/// `now` is injected so sweeps are testable without waiting; the caller
	/// is responsible for notifying the affected customers afterwards.
	pub async fn sweep_expired(&self, now: u64) -> Result<Vec<Order>, EngineError> {
		let timeout_secs = self.settings.timeout.as_secs();
		let _guard = self.mutation.lock().await;

		let mut expired = Vec::new();
		for order in self.store.all().await.map_err(EngineError::from_store)? {
			if now.saturating_sub(order.created_at) > timeout_secs {
				self.store
					.delete(&order.customer)
					.await
					.map_err(EngineError::from_store)?;
				tracing::info!(
					customer = %order.customer,
					code = %order.code,
					"Order expired"
				);
				expired.push(order);
			}
		}

		Ok(expired)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use espeto_store::implementations::memory::{MemoryStore, MemoryStoreSchema};
	use espeto_types::ConfigSchema;
	use std::collections::HashMap;
	use tokio::sync::RwLock;

	/// Test-only store keyed by code, so one customer can hold several
	/// orders and the configured limit is exercised beyond the single slot
	/// the production store keeps per customer.
	struct MultiStore {
		orders: RwLock<HashMap<String, Order>>,
	}

	impl MultiStore {
		fn new() -> Self {
			Self {
				orders: RwLock::new(HashMap::new()),
			}
		}
	}

	#[async_trait::async_trait]
	impl StoreInterface for MultiStore {
		async fn insert(&self, order: Order) -> Result<(), StoreError> {
			self.orders.write().await.insert(order.code.clone(), order);
			Ok(())
		}

		async fn get(&self, customer: &str) -> Result<Order, StoreError> {
			self.orders
				.read()
				.await
				.values()
				.find(|order| order.customer == customer)
				.cloned()
				.ok_or(StoreError::NotFound)
		}

		async fn delete(&self, customer: &str) -> Result<(), StoreError> {
			self.orders
				.write()
				.await
				.retain(|_, order| order.customer != customer);
			Ok(())
		}

		async fn find_by_code(&self, code: &str) -> Result<Order, StoreError> {
			self.orders
				.read()
				.await
				.get(code)
				.cloned()
				.ok_or(StoreError::NotFound)
		}

		async fn all(&self) -> Result<Vec<Order>, StoreError> {
			Ok(self.orders.read().await.values().cloned().collect())
		}

		async fn count(&self) -> Result<usize, StoreError> {
			Ok(self.orders.read().await.len())
		}

		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(MemoryStoreSchema)
		}
	}

	fn test_engine(max_active: usize) -> Engine {
		Engine::new(
			Arc::new(MemoryStore::new()),
			EngineSettings {
				max_active_per_customer: max_active,
				timeout: Duration::from_secs(30 * 60),
			},
			Replies::new("https://example.com/cardapio", "+55 68 9000-0000"),
		)
	}

	#[tokio::test]
	async fn test_create_order_returns_code() {
		let engine = test_engine(3);
		let code = engine
			.create_order("55999990000", "PEDIDO - ESPETINHOS\n1x combo")
			.await
			.unwrap();

		assert!(code.starts_with("ESP"));
		assert_eq!(code.len(), 12);

		let order = engine.status_of("55999990000").await.unwrap();
		assert_eq!(order.status, OrderStatus::Iniciado);
		assert_eq!(order.code, code);
	}

	#[tokio::test]
	async fn test_one_active_order_per_customer() {
		let engine = test_engine(3);
		engine.create_order("55999990000", "pedido 1").await.unwrap();
		engine.create_order("55999990000", "pedido 2").await.unwrap();

		// Keyed by customer: the second order replaced the first
		assert_eq!(engine.active_count().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_limit_exceeded_with_limit_one() {
		let engine = test_engine(1);
		engine.create_order("55999990000", "pedido 1").await.unwrap();

		let result = engine.create_order("55999990000", "pedido 2").await;
		assert!(matches!(
			result,
			Err(EngineError::LimitExceeded { limit: 1 })
		));

		// A different customer is unaffected
		assert!(engine.create_order("55888880000", "pedido").await.is_ok());
	}

	#[tokio::test]
	async fn test_fourth_order_exceeds_default_limit() {
		// A store that keeps several orders per customer exercises the
		// configured limit of 3
		let engine = Engine::new(
			Arc::new(MultiStore::new()),
			EngineSettings {
				max_active_per_customer: 3,
				timeout: Duration::from_secs(30 * 60),
			},
			Replies::new("https://example.com/cardapio", "+55 68 9000-0000"),
		);

		for i in 0..3 {
			engine
				.create_order("55999990000", &format!("pedido {i}"))
				.await
				.unwrap();
		}
		assert_eq!(engine.active_count().await.unwrap(), 3);

		let result = engine.create_order("55999990000", "pedido 4").await;
		assert!(matches!(
			result,
			Err(EngineError::LimitExceeded { limit: 3 })
		));
	}

	#[tokio::test]
	async fn test_confirm_transitions_to_confirmado() {
		let engine = test_engine(3);
		engine.create_order("55999990000", "pedido").await.unwrap();

		let order = engine.confirm("55999990000").await.unwrap();
		assert_eq!(order.status, OrderStatus::Confirmado);
	}

	#[tokio::test]
	async fn test_confirm_twice_rejected() {
		let engine = test_engine(3);
		engine.create_order("55999990000", "pedido").await.unwrap();
		engine.confirm("55999990000").await.unwrap();

		let result = engine.confirm("55999990000").await;
		assert!(matches!(result, Err(EngineError::AlreadyConfirmed)));
	}

	#[tokio::test]
	async fn test_confirm_without_order_rejected() {
		let engine = test_engine(3);
		let result = engine.confirm("55999990000").await;
		assert!(matches!(result, Err(EngineError::NotFound)));
	}

	#[tokio::test]
	async fn test_cancel_removes_order() {
		let engine = test_engine(3);
		engine.create_order("55999990000", "pedido").await.unwrap();

		engine.cancel("55999990000").await.unwrap();
		assert!(matches!(
			engine.status_of("55999990000").await,
			Err(EngineError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_set_status_requires_matching_code() {
		let engine = test_engine(3);
		let code = engine.create_order("55999990000", "pedido").await.unwrap();

		let result = engine
			.set_status("55999990000", "ESP000000000", "em_preparo")
			.await;
		assert!(matches!(result, Err(EngineError::NotFound)));

		// No mutation happened
		let order = engine.status_of("55999990000").await.unwrap();
		assert_eq!(order.status, OrderStatus::Iniciado);
		assert_eq!(order.code, code);
	}

	#[tokio::test]
	async fn test_set_status_rejects_unknown_status() {
		let engine = test_engine(3);
		let code = engine.create_order("55999990000", "pedido").await.unwrap();

		let result = engine.set_status("55999990000", &code, "entregando").await;
		assert!(matches!(result, Err(EngineError::InvalidStatus(_))));
	}

	#[tokio::test]
	async fn test_set_status_updates_and_notifies() {
		let engine = test_engine(3);
		let code = engine.create_order("55999990000", "pedido").await.unwrap();

		let change = engine
			.set_status("55999990000", &code, "em_preparo")
			.await
			.unwrap();
		assert_eq!(change.requested, OrderStatus::EmPreparo);
		assert_eq!(change.effective, OrderStatus::EmPreparo);
		assert!(change.notification.is_some());

		let order = engine.status_of("55999990000").await.unwrap();
		assert_eq!(order.status, OrderStatus::EmPreparo);
	}

	#[tokio::test]
	async fn test_delivered_order_finalized_and_removed() {
		let engine = test_engine(3);
		let code = engine.create_order("55999990000", "pedido").await.unwrap();

		let change = engine
			.set_status("55999990000", &code, "entregue")
			.await
			.unwrap();
		assert_eq!(change.requested, OrderStatus::Entregue);
		assert_eq!(change.effective, OrderStatus::Finalizado);
		assert!(change.notification.is_some());

		// Absent immediately after the call returns
		assert!(matches!(
			engine.status_of("55999990000").await,
			Err(EngineError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_concurrent_set_status_last_write_wins() {
		let engine = Arc::new(test_engine(3));
		let code = engine.create_order("55999990000", "pedido").await.unwrap();

		let first = {
			let engine = engine.clone();
			let code = code.clone();
			tokio::spawn(async move { engine.set_status("55999990000", &code, "em_preparo").await })
		};
		let second = {
			let engine = engine.clone();
			let code = code.clone();
			tokio::spawn(async move { engine.set_status("55999990000", &code, "pronto").await })
		};

		first.await.unwrap().unwrap();
		second.await.unwrap().unwrap();

		// One of the two targets survives, never a partial state
		let status = engine.status_of("55999990000").await.unwrap().status;
		assert!(
			status == OrderStatus::EmPreparo || status == OrderStatus::Pronto,
			"unexpected status {status}"
		);
	}

	#[tokio::test]
	async fn test_sweep_removes_only_stale_orders() {
		let engine = test_engine(3);
		engine.create_order("55999990000", "pedido").await.unwrap();
		engine.create_order("55888880000", "pedido").await.unwrap();

		// Nothing expires at the current time
		let expired = engine.sweep_expired(now_secs()).await.unwrap();
		assert!(expired.is_empty());

		// Advance the clock past the 30 minute window
		let expired = engine
			.sweep_expired(now_secs() + 31 * 60)
			.await
			.unwrap();
		assert_eq!(expired.len(), 2);
		assert_eq!(engine.active_count().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_stats_totals_match() {
		let engine = test_engine(3);
		engine.create_order("55999990000", "pedido").await.unwrap();
		engine.create_order("55888880000", "pedido").await.unwrap();
		engine.confirm("55888880000").await.unwrap();

		let stats = engine.stats().await.unwrap();
		assert_eq!(stats.total_pedidos, 2);
		assert_eq!(stats.por_status.values().sum::<usize>(), stats.total_pedidos);
		assert_eq!(stats.por_status[&OrderStatus::Iniciado], 1);
		assert_eq!(stats.por_status[&OrderStatus::Confirmado], 1);
		assert_eq!(stats.ultima_hora, 2);
	}
}
