//! Webhook outbound sink.
//!
//! Delivers outbound messages by posting them to the chat gateway's HTTP
//! endpoint. The gateway owns the actual chat-network session; from this
//! side a delivery is one JSON POST.
//!
//! ## Configuration
//!
//! - `url` — gateway endpoint receiving `{ "to": "...", "body": "..." }`
//! - `timeout_seconds` — request timeout (default: 10)

use crate::{ChatError, OutboundInterface};
use async_trait::async_trait;
use espeto_types::{ConfigSchema, Field, FieldType, OutboundMessage, Schema, ValidationError};
use std::time::Duration;

/// Default request timeout for gateway posts.
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Webhook outbound sink implementation.
pub struct WebhookOutbound {
	/// Gateway endpoint URL.
	url: String,
	/// Reusable HTTP client with connection pooling.
	client: reqwest::Client,
}

impl WebhookOutbound {
	/// Creates a new webhook sink posting to the given URL.
	pub fn new(url: String, timeout: Duration) -> Result<Self, ChatError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| ChatError::Connection(e.to_string()))?;

		Ok(Self { url, client })
	}
}

#[async_trait]
impl OutboundInterface for WebhookOutbound {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(WebhookOutboundSchema)
	}

	async fn send(&self, message: &OutboundMessage) -> Result<(), ChatError> {
		let response = self
			.client
			.post(&self.url)
			.json(message)
			.send()
			.await
			.map_err(|e| ChatError::Transport(e.to_string()))?;

		if !response.status().is_success() {
			return Err(ChatError::Transport(format!(
				"Gateway returned {}",
				response.status()
			)));
		}

		Ok(())
	}
}

/// Configuration schema for the webhook outbound sink.
pub struct WebhookOutboundSchema;

impl ConfigSchema for WebhookOutboundSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("url", FieldType::String).with_validator(|v| {
				let url = v.as_str().unwrap_or("");
				if url.starts_with("http://") || url.starts_with("https://") {
					Ok(())
				} else {
					Err("must be an http(s) URL".to_string())
				}
			})],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);
		schema.validate(config)
	}
}

/// Registry entry for the webhook outbound sink.
pub struct Registry;

impl espeto_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "webhook";
	type Factory = crate::OutboundFactory;

	fn factory() -> Self::Factory {
		create_outbound
	}
}

impl crate::OutboundRegistry for Registry {}

/// Factory function to create a webhook outbound sink from configuration.
///
/// Configuration parameters:
/// - `url`: gateway endpoint (required)
/// - `timeout_seconds`: request timeout (default: 10)
pub fn create_outbound(config: &toml::Value) -> Result<Box<dyn OutboundInterface>, ChatError> {
	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| ChatError::Configuration("url is required".to_string()))?
		.to_string();

	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

	Ok(Box::new(WebhookOutbound::new(
		url,
		Duration::from_secs(timeout),
	)?))
}
