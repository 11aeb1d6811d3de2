//! In-memory outbound sink.
//!
//! Records every message instead of delivering it. Useful for development
//! without a gateway and as the delivery spy in tests.

use crate::{ChatError, OutboundInterface};
use async_trait::async_trait;
use espeto_types::{ConfigSchema, OutboundMessage, Schema, ValidationError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory sink implementation.
///
/// Clones share the same message log, so a test can keep one handle while
/// the service owns the other.
#[derive(Clone)]
pub struct MemorySink {
	/// Messages recorded so far.
	sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl MemorySink {
	/// Creates a new empty MemorySink instance.
	pub fn new() -> Self {
		Self {
			sent: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// Returns a snapshot of the messages recorded so far.
	pub async fn messages(&self) -> Vec<OutboundMessage> {
		self.sent.lock().await.clone()
	}

	/// Clears the recorded messages.
	pub async fn clear(&self) {
		self.sent.lock().await.clear();
	}
}

impl Default for MemorySink {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl OutboundInterface for MemorySink {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemorySinkSchema)
	}

	async fn send(&self, message: &OutboundMessage) -> Result<(), ChatError> {
		tracing::debug!(to = %message.to, "Recording outbound message");
		self.sent.lock().await.push(message.clone());
		Ok(())
	}
}

/// Configuration schema for MemorySink.
pub struct MemorySinkSchema;

impl ConfigSchema for MemorySinkSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory sink has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Registry entry for the memory sink.
pub struct Registry;

impl espeto_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::OutboundFactory;

	fn factory() -> Self::Factory {
		create_outbound
	}
}

impl crate::OutboundRegistry for Registry {}

/// Factory function to create a memory sink from configuration.
///
/// Configuration parameters: none required.
pub fn create_outbound(_config: &toml::Value) -> Result<Box<dyn OutboundInterface>, ChatError> {
	Ok(Box::new(MemorySink::new()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_records_messages() {
		let sink = MemorySink::new();
		let spy = sink.clone();

		sink.send(&OutboundMessage::new("55999990000", "Olá!"))
			.await
			.unwrap();
		sink.send(&OutboundMessage::new("55888880000", "Pedido pronto"))
			.await
			.unwrap();

		let messages = spy.messages().await;
		assert_eq!(messages.len(), 2);
		assert_eq!(messages[0].to, "55999990000");
		assert_eq!(messages[1].body, "Pedido pronto");
	}
}
