//! Timeout sweeper.
//!
//! Periodic background task that expires orders idle past the timeout window
//! and sends each affected customer a one-shot notice. Removal is committed
//! by the engine before any notification is attempted, so a failed delivery
//! never resurrects an order.

use crate::engine::{now_secs, Engine};
use espeto_chat::OutboundService;
use espeto_types::OutboundMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Periodic expiry sweep over the order store.
pub struct Sweeper {
	engine: Arc<Engine>,
	outbound: Arc<OutboundService>,
	interval: Duration,
}

impl Sweeper {
	/// Creates a sweeper running every `interval`.
	pub fn new(engine: Arc<Engine>, outbound: Arc<OutboundService>, interval: Duration) -> Self {
		Self {
			engine,
			outbound,
			interval,
		}
	}

	/// Spawns the periodic sweep task.
	///
	/// The task runs until the cancellation token fires, which makes it
	/// stoppable at process shutdown instead of an unowned timer.
	pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(self.interval);
			ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
			// The first tick completes immediately; skip it so sweeps start
			// one full interval after startup.
			ticker.tick().await;

			loop {
				tokio::select! {
					_ = ticker.tick() => {
						self.sweep_once(now_secs()).await;
					}
					_ = shutdown.cancelled() => {
						tracing::debug!("Sweeper stopped");
						break;
					}
				}
			}
		})
	}

	/// Runs a single sweep at the given clock reading.
	///
	/// Expired orders are already removed when the notifications go out;
	/// delivery failures are logged by the sink and otherwise ignored.
	pub async fn sweep_once(&self, now: u64) {
		let expired = match self.engine.sweep_expired(now).await {
			Ok(expired) => expired,
			Err(e) => {
				tracing::error!(error = %e, "Expiry sweep failed");
				return;
			},
		};

		for order in expired {
			let notice = self.engine.replies().expired(&order.code);
			self.outbound
				.dispatch(&OutboundMessage::new(order.customer, notice))
				.await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::EngineSettings;
	use crate::replies::Replies;
	use espeto_chat::implementations::outbound::memory::MemorySink;
	use espeto_store::implementations::memory::MemoryStore;

	fn test_setup() -> (Sweeper, Arc<Engine>, MemorySink) {
		let engine = Arc::new(Engine::new(
			Arc::new(MemoryStore::new()),
			EngineSettings {
				max_active_per_customer: 3,
				timeout: Duration::from_secs(30 * 60),
			},
			Replies::new("https://example.com/cardapio", "+55 68 9000-0000"),
		));
		let sink = MemorySink::new();
		let outbound = Arc::new(OutboundService::new(Box::new(sink.clone())));
		let sweeper = Sweeper::new(engine.clone(), outbound, Duration::from_secs(300));
		(sweeper, engine, sink)
	}

	#[tokio::test]
	async fn test_sweep_notifies_each_expired_order_once() {
		let (sweeper, engine, sink) = test_setup();
		engine.create_order("55999990000", "pedido").await.unwrap();
		engine.create_order("55888880000", "pedido").await.unwrap();

		// Simulated clock past the 30 minute window
		sweeper.sweep_once(now_secs() + 31 * 60).await;

		assert_eq!(engine.active_count().await.unwrap(), 0);
		let messages = sink.messages().await;
		assert_eq!(messages.len(), 2);
		assert!(messages.iter().all(|m| m.body.contains("expirou")));

		// A second sweep finds nothing and sends nothing
		sweeper.sweep_once(now_secs() + 62 * 60).await;
		assert_eq!(sink.messages().await.len(), 2);
	}

	#[tokio::test]
	async fn test_fresh_orders_survive_sweep() {
		let (sweeper, engine, sink) = test_setup();
		engine.create_order("55999990000", "pedido").await.unwrap();

		sweeper.sweep_once(now_secs()).await;

		assert_eq!(engine.active_count().await.unwrap(), 1);
		assert!(sink.messages().await.is_empty());
	}

	#[tokio::test]
	async fn test_spawned_sweeper_stops_on_cancel() {
		let (sweeper, _engine, _sink) = test_setup();
		let token = CancellationToken::new();

		let handle = sweeper.spawn(token.clone());
		token.cancel();
		handle.await.unwrap();
	}
}
