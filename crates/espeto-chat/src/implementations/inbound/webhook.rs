//! Webhook inbound source.
//!
//! Runs an embedded HTTP server that the chat gateway (the process bridging
//! the real chat network) posts customer messages to. Each accepted message
//! is forwarded into the service's inbound channel.
//!
//! ## API Endpoint
//!
//! - `POST /message` — body `{ "from": "...", "body": "..." }`
//!
//! ## Configuration
//!
//! - `host` — address to bind (default: "127.0.0.1")
//! - `port` — port to listen on (default: 3100)

use crate::{ChatError, InboundInterface};
use async_trait::async_trait;
use axum::{
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Json},
	routing::post,
	Router,
};
use espeto_types::{ConfigSchema, Field, FieldType, InboundMessage, Schema, ValidationError};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tower_http::cors::CorsLayer;

/// Default bind address for the webhook listener.
const DEFAULT_HOST: &str = "127.0.0.1";
/// Default port for the webhook listener.
const DEFAULT_PORT: u16 = 3100;

/// Shared state for the webhook server.
#[derive(Clone)]
struct WebhookState {
	/// Channel to forward received messages into the service.
	message_sender: mpsc::UnboundedSender<InboundMessage>,
}

/// Webhook inbound source implementation.
///
/// Listens for gateway posts and forwards them as [`InboundMessage`]s. The
/// embedded server supports graceful shutdown via an internal channel so the
/// source can be stopped cleanly at process shutdown.
pub struct WebhookInbound {
	host: String,
	port: u16,
	/// Flag indicating if the server is running.
	is_running: Arc<AtomicBool>,
	/// Channel for signaling server shutdown.
	shutdown_signal: Arc<Mutex<Option<mpsc::Sender<()>>>>,
}

impl WebhookInbound {
	/// Creates a new webhook inbound source bound to the given address.
	pub fn new(host: String, port: u16) -> Self {
		Self {
			host,
			port,
			is_running: Arc::new(AtomicBool::new(false)),
			shutdown_signal: Arc::new(Mutex::new(None)),
		}
	}

	/// Main webhook server task.
	///
	/// Runs the HTTP server that listens for gateway posts until the
	/// shutdown channel fires.
	async fn run_server(
		host: String,
		port: u16,
		message_sender: mpsc::UnboundedSender<InboundMessage>,
		mut shutdown_rx: mpsc::Receiver<()>,
	) -> Result<(), ChatError> {
		let state = WebhookState { message_sender };

		let app = Router::new()
			.route("/message", post(handle_message))
			.layer(CorsLayer::permissive())
			.with_state(state);

		let addr = format!("{}:{}", host, port)
			.parse::<SocketAddr>()
			.map_err(|e| ChatError::Connection(format!("Invalid address '{}:{}': {}", host, port, e)))?;

		let listener = tokio::net::TcpListener::bind(addr)
			.await
			.map_err(|e| ChatError::Connection(format!("Failed to bind {}: {}", addr, e)))?;

		tracing::info!(%addr, "Inbound webhook listening");

		axum::serve(listener, app)
			.with_graceful_shutdown(async move {
				let _ = shutdown_rx.recv().await;
			})
			.await
			.map_err(|e| ChatError::Connection(e.to_string()))
	}
}

/// Handles POST /message requests from the gateway.
async fn handle_message(
	State(state): State<WebhookState>,
	Json(message): Json<InboundMessage>,
) -> impl IntoResponse {
	if message.from.is_empty() {
		return (
			StatusCode::BAD_REQUEST,
			Json(serde_json::json!({ "status": "error", "message": "'from' cannot be empty" })),
		);
	}

	match state.message_sender.send(message) {
		Ok(()) => (
			StatusCode::OK,
			Json(serde_json::json!({ "status": "ok" })),
		),
		// Receiver dropped: the service is shutting down
		Err(_) => (
			StatusCode::SERVICE_UNAVAILABLE,
			Json(serde_json::json!({ "status": "error", "message": "service unavailable" })),
		),
	}
}

#[async_trait]
impl InboundInterface for WebhookInbound {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(WebhookInboundSchema)
	}

	async fn start_receiving(
		&self,
		sender: mpsc::UnboundedSender<InboundMessage>,
	) -> Result<(), ChatError> {
		if self.is_running.load(Ordering::SeqCst) {
			return Err(ChatError::AlreadyReceiving);
		}

		let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
		*self.shutdown_signal.lock().await = Some(shutdown_tx);

		let host = self.host.clone();
		let port = self.port;
		let is_running = self.is_running.clone();
		is_running.store(true, Ordering::SeqCst);

		tokio::spawn(async move {
			if let Err(e) = Self::run_server(host, port, sender, shutdown_rx).await {
				tracing::error!(error = %e, "Inbound webhook server terminated");
			}
			is_running.store(false, Ordering::SeqCst);
		});

		Ok(())
	}

	async fn stop_receiving(&self) -> Result<(), ChatError> {
		if let Some(shutdown_tx) = self.shutdown_signal.lock().await.take() {
			let _ = shutdown_tx.send(()).await;
		}
		self.is_running.store(false, Ordering::SeqCst);
		Ok(())
	}
}

/// Configuration schema for the webhook inbound source.
pub struct WebhookInboundSchema;

impl ConfigSchema for WebhookInboundSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("host", FieldType::String),
				Field::new(
					"port",
					FieldType::Integer {
						min: Some(1),
						max: Some(65535),
					},
				),
			],
		);
		schema.validate(config)
	}
}

/// Registry entry for the webhook inbound source.
pub struct Registry;

impl espeto_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "webhook";
	type Factory = crate::InboundFactory;

	fn factory() -> Self::Factory {
		create_inbound
	}
}

impl crate::InboundRegistry for Registry {}

/// Factory function to create a webhook inbound source from configuration.
///
/// Configuration parameters:
/// - `host`: bind address (default: "127.0.0.1")
/// - `port`: listen port (default: 3100)
pub fn create_inbound(config: &toml::Value) -> Result<Box<dyn InboundInterface>, ChatError> {
	let host = config
		.get("host")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_HOST)
		.to_string();

	let port = config
		.get("port")
		.and_then(|v| v.as_integer())
		.unwrap_or(DEFAULT_PORT as i64) as u16;

	Ok(Box::new(WebhookInbound::new(host, port)))
}
