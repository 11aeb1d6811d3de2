//! Core engine for the espeto order service.
//!
//! This module provides the main orchestration logic for the service,
//! coordinating the order store, the chat transports, the command
//! interpreter and the timeout sweeper. It includes the factory pattern for
//! assembling a bot instance from configuration.

/// Order code generation.
pub mod codegen;
/// The order lifecycle engine and its error taxonomy.
pub mod engine;
/// Chat command interpreter.
pub mod interpreter;
/// Lifecycle transition rules.
pub mod lifecycle;
/// Customer-facing reply templates.
pub mod replies;
/// Periodic expiry sweep.
pub mod sweeper;

pub use engine::{now_secs, Engine, EngineError, EngineSettings, StatusChange};
pub use interpreter::{Command, Interpreter, ORDER_TRIGGER};
pub use replies::Replies;
pub use sweeper::Sweeper;

use espeto_chat::{InboundFactory, InboundInterface, OutboundFactory, OutboundService};
use espeto_config::Config;
use espeto_store::StoreFactory;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while assembling or running the bot.
#[derive(Debug, Error)]
pub enum BotError {
	/// Error related to configuration issues.
	#[error("Configuration error: {0}")]
	Config(String),
	/// Error from one of the underlying services.
	#[error("Service error: {0}")]
	Service(String),
}

/// The assembled bot: engine, transports and sweeper under one shutdown token.
///
/// The bot consumes the inbound message channel, runs every message through
/// the interpreter and dispatches the reply through the outbound sink. The
/// HTTP API runs alongside in the service binary and shares the engine.
pub struct Bot {
	/// Service configuration.
	config: Config,
	/// The order lifecycle engine, shared with the HTTP API.
	engine: Arc<Engine>,
	/// Inbound message source.
	inbound: Box<dyn InboundInterface>,
	/// Outbound message sink, shared with the HTTP API and the sweeper.
	outbound: Arc<OutboundService>,
	/// Process-wide shutdown token.
	shutdown: CancellationToken,
}

impl Bot {
	/// Main execution loop.
	///
	/// This method:
	/// 1. Starts the inbound source feeding the message channel
	/// 2. Spawns the timeout sweeper on its interval
	/// 3. Interprets every inbound message and dispatches the reply
	/// 4. Stops the source and the sweeper when the shutdown token fires
	pub async fn run(&self) -> Result<(), BotError> {
		let (message_tx, mut message_rx) = mpsc::unbounded_channel();
		self.inbound
			.start_receiving(message_tx)
			.await
			.map_err(|e| BotError::Service(e.to_string()))?;

		let sweeper = Sweeper::new(
			self.engine.clone(),
			self.outbound.clone(),
			Duration::from_secs(self.config.orders.sweep_interval_seconds),
		);
		let sweeper_handle = sweeper.spawn(self.shutdown.clone());

		let interpreter = Interpreter::new(self.engine.clone());

		loop {
			tokio::select! {
				Some(message) = message_rx.recv() => {
					tracing::info!(customer = %message.from, "Message received");
					let reply = interpreter.handle(&message).await;
					self.outbound.dispatch(&reply).await;
				}

				_ = self.shutdown.cancelled() => {
					break;
				}
			}
		}

		// Cleanup
		self.inbound
			.stop_receiving()
			.await
			.map_err(|e| BotError::Service(e.to_string()))?;
		let _ = sweeper_handle.await;

		Ok(())
	}

	/// Returns the shared lifecycle engine.
	pub fn engine(&self) -> &Arc<Engine> {
		&self.engine
	}

	/// Returns the shared outbound sink service.
	pub fn outbound(&self) -> &Arc<OutboundService> {
		&self.outbound
	}

	/// Returns a handle to the process-wide shutdown token.
	pub fn shutdown_token(&self) -> CancellationToken {
		self.shutdown.clone()
	}

	/// Returns the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}
}

/// Factory functions for all pluggable implementations.
///
/// Keys must match the implementation names used in the configuration file.
pub struct BotFactories {
	pub store_factories: HashMap<String, StoreFactory>,
	pub inbound_factories: HashMap<String, InboundFactory>,
	pub outbound_factories: HashMap<String, OutboundFactory>,
}

/// Builder for constructing a [`Bot`] with pluggable implementations.
///
/// Each seam (store, inbound, outbound) is created by the factory registered
/// under the configured primary name, and its configuration table is
/// validated against the implementation's schema before use.
pub struct BotBuilder {
	config: Config,
}

impl BotBuilder {
	/// Creates a new BotBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the Bot using the provided factories.
	pub fn build(self, factories: BotFactories) -> Result<Bot, BotError> {
		let config = self.config;

		// Create store backend
		let store_primary = config.store.primary.clone();
		let store_config = config
			.store
			.implementations
			.get(&store_primary)
			.ok_or_else(|| {
				BotError::Config(format!("Store implementation '{}' not configured", store_primary))
			})?;
		let store_factory = factories.store_factories.get(&store_primary).ok_or_else(|| {
			BotError::Config(format!("Store factory '{}' not registered", store_primary))
		})?;
		let store = store_factory(store_config).map_err(|e| {
			BotError::Config(format!("Failed to create store '{}': {}", store_primary, e))
		})?;
		store
			.config_schema()
			.validate(store_config)
			.map_err(|e| BotError::Config(format!("Invalid store configuration: {}", e)))?;
		tracing::info!(component = "store", implementation = %store_primary, "Loaded");

		// Create inbound source
		let inbound_primary = config.chat.inbound.primary.clone();
		let inbound_config = config
			.chat
			.inbound
			.implementations
			.get(&inbound_primary)
			.ok_or_else(|| {
				BotError::Config(format!(
					"Inbound implementation '{}' not configured",
					inbound_primary
				))
			})?;
		let inbound_factory = factories
			.inbound_factories
			.get(&inbound_primary)
			.ok_or_else(|| {
				BotError::Config(format!("Inbound factory '{}' not registered", inbound_primary))
			})?;
		let inbound = inbound_factory(inbound_config).map_err(|e| {
			BotError::Config(format!(
				"Failed to create inbound source '{}': {}",
				inbound_primary, e
			))
		})?;
		inbound
			.config_schema()
			.validate(inbound_config)
			.map_err(|e| BotError::Config(format!("Invalid inbound configuration: {}", e)))?;
		tracing::info!(component = "chat.inbound", implementation = %inbound_primary, "Loaded");

		// Create outbound sink
		let outbound_primary = config.chat.outbound.primary.clone();
		let outbound_config = config
			.chat
			.outbound
			.implementations
			.get(&outbound_primary)
			.ok_or_else(|| {
				BotError::Config(format!(
					"Outbound implementation '{}' not configured",
					outbound_primary
				))
			})?;
		let outbound_factory = factories
			.outbound_factories
			.get(&outbound_primary)
			.ok_or_else(|| {
				BotError::Config(format!(
					"Outbound factory '{}' not registered",
					outbound_primary
				))
			})?;
		let outbound = outbound_factory(outbound_config).map_err(|e| {
			BotError::Config(format!(
				"Failed to create outbound sink '{}': {}",
				outbound_primary, e
			))
		})?;
		outbound
			.config_schema()
			.validate(outbound_config)
			.map_err(|e| BotError::Config(format!("Invalid outbound configuration: {}", e)))?;
		tracing::info!(component = "chat.outbound", implementation = %outbound_primary, "Loaded");

		let replies = Replies::new(&config.service.menu_url, &config.service.contact);
		let engine = Arc::new(Engine::new(
			Arc::from(store),
			EngineSettings::from(&config.orders),
			replies,
		));

		Ok(Bot {
			config,
			engine,
			inbound,
			outbound: Arc::new(OutboundService::new(outbound)),
			shutdown: CancellationToken::new(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const TEST_CONFIG: &str = r#"
[service]
menu_url = "https://example.com/cardapio"
contact = "+55 68 9000-0000"

[store]
primary = "memory"
[store.implementations.memory]

[chat.inbound]
primary = "webhook"
[chat.inbound.implementations.webhook]
port = 3101

[chat.outbound]
primary = "memory"
[chat.outbound.implementations.memory]
"#;

	fn test_factories() -> BotFactories {
		BotFactories {
			store_factories: espeto_store::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			inbound_factories: espeto_chat::get_all_inbound_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			outbound_factories: espeto_chat::get_all_outbound_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	#[test]
	fn test_build_with_registered_factories() {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let bot = BotBuilder::new(config).build(test_factories()).unwrap();
		assert_eq!(bot.config().store.primary, "memory");
	}

	#[test]
	fn test_build_fails_without_factory() {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let factories = BotFactories {
			store_factories: HashMap::new(),
			inbound_factories: HashMap::new(),
			outbound_factories: HashMap::new(),
		};

		let result = BotBuilder::new(config).build(factories);
		assert!(matches!(result, Err(BotError::Config(_))));
	}

	#[tokio::test]
	async fn test_bot_run_stops_on_shutdown() {
		let config: Config = TEST_CONFIG.parse().unwrap();
		let bot = BotBuilder::new(config).build(test_factories()).unwrap();

		let token = bot.shutdown_token();
		token.cancel();
		bot.run().await.unwrap();
	}
}
