//! Chat transport module for the espeto order service.
//!
//! The chat network itself (connection, authentication, message rendering) is
//! an external collaborator. This module provides the two seams the service
//! sees: an inbound source that feeds customer messages into a channel, and
//! an outbound sink that delivers replies and notifications. Both seams are
//! pluggable behind factory functions driven by TOML configuration.

use async_trait::async_trait;
use espeto_types::{ConfigSchema, ImplementationRegistry, InboundMessage, OutboundMessage};
use thiserror::Error;
use tokio::sync::mpsc;

/// Re-export implementations
pub mod implementations {
	pub mod inbound {
		pub mod webhook;
	}
	pub mod outbound {
		pub mod memory;
		pub mod webhook;
	}
}

/// Errors that can occur in the chat transports.
#[derive(Debug, Error)]
pub enum ChatError {
	/// Error that occurs when establishing or binding a transport fails.
	#[error("Connection error: {0}")]
	Connection(String),
	/// Error that occurs when delivering an outbound message fails.
	#[error("Transport error: {0}")]
	Transport(String),
	/// Error that occurs when starting an already-receiving source.
	#[error("Already receiving")]
	AlreadyReceiving,
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for inbound message sources.
///
/// A source pushes every customer message it receives into the provided
/// channel and keeps doing so until stopped.
#[async_trait]
pub trait InboundInterface: Send + Sync {
	/// Returns the configuration schema for this source implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Starts receiving customer messages.
	///
	/// Received messages are sent through the provided channel. The source
	/// keeps receiving until [`stop_receiving`](Self::stop_receiving) is
	/// called or a fatal transport error occurs.
	async fn start_receiving(
		&self,
		sender: mpsc::UnboundedSender<InboundMessage>,
	) -> Result<(), ChatError>;

	/// Stops receiving and releases transport resources.
	async fn stop_receiving(&self) -> Result<(), ChatError>;
}

/// Trait defining the interface for outbound message sinks.
#[async_trait]
pub trait OutboundInterface: Send + Sync {
	/// Returns the configuration schema for this sink implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Delivers one message to the customer's chat.
	async fn send(&self, message: &OutboundMessage) -> Result<(), ChatError>;
}

/// Type alias for inbound source factory functions.
pub type InboundFactory = fn(&toml::Value) -> Result<Box<dyn InboundInterface>, ChatError>;

/// Type alias for outbound sink factory functions.
pub type OutboundFactory = fn(&toml::Value) -> Result<Box<dyn OutboundInterface>, ChatError>;

/// Registry trait for inbound source implementations.
pub trait InboundRegistry: ImplementationRegistry<Factory = InboundFactory> {}

/// Registry trait for outbound sink implementations.
pub trait OutboundRegistry: ImplementationRegistry<Factory = OutboundFactory> {}

/// Get all registered inbound source implementations.
pub fn get_all_inbound_implementations() -> Vec<(&'static str, InboundFactory)> {
	use implementations::inbound::webhook;

	vec![(webhook::Registry::NAME, webhook::Registry::factory())]
}

/// Get all registered outbound sink implementations.
pub fn get_all_outbound_implementations() -> Vec<(&'static str, OutboundFactory)> {
	use implementations::outbound::{memory, webhook};

	vec![
		(webhook::Registry::NAME, webhook::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Service wrapping the configured outbound sink.
///
/// Provides the fire-and-forget dispatch used after state commits: the state
/// change has already happened, so a delivery failure is recorded and
/// swallowed rather than propagated.
pub struct OutboundService {
	/// The underlying sink implementation.
	sink: Box<dyn OutboundInterface>,
}

impl OutboundService {
	/// Creates a new OutboundService with the specified sink.
	pub fn new(sink: Box<dyn OutboundInterface>) -> Self {
		Self { sink }
	}

	/// Delivers one message, surfacing transport failures to the caller.
	pub async fn send(&self, message: &OutboundMessage) -> Result<(), ChatError> {
		self.sink.send(message).await
	}

	/// Fire-and-forget dispatch.
	///
	/// A failed delivery never rolls back the operation that triggered it;
	/// the failure is logged with the recipient for diagnosis.
	pub async fn dispatch(&self, message: &OutboundMessage) {
		if let Err(e) = self.sink.send(message).await {
			tracing::warn!(to = %message.to, error = %e, "Failed to deliver chat message");
		}
	}
}
