//! HTTP server for the operator API.
//!
//! This module provides the HTTP server infrastructure for the dashboard
//! API: routing, CORS, shared state and the bind-with-fallback behavior for
//! the listen port.

use axum::{
	response::Html,
	routing::{get, post},
	Router,
};
use espeto_chat::OutboundService;
use espeto_config::ApiConfig;
use espeto_core::Engine;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the lifecycle engine for reads and status updates.
	pub engine: Arc<Engine>,
	/// Outbound sink for status notifications.
	pub outbound: Arc<OutboundService>,
	/// Process start time, reported by the liveness probe.
	pub started_at: Instant,
}

/// Builds the API router over the given state.
pub fn router(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/pedidos", get(crate::apis::pedidos::list_orders))
				.route("/pedido/{codigo}", get(crate::apis::pedidos::get_order))
				.route("/pedido/status", post(crate::apis::pedidos::update_status))
				.route("/stats", get(crate::apis::pedidos::stats))
				.route("/health", get(crate::apis::pedidos::health)),
		)
		.route("/dashboard", get(dashboard))
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(state)
}

/// Starts the HTTP server for the operator API.
///
/// The server runs until the shutdown token fires. When the configured port
/// is already in use the bind is retried once on the next port.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<Engine>,
	outbound: Arc<OutboundService>,
	shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
	let state = AppState {
		engine,
		outbound,
		started_at: Instant::now(),
	};

	let app = router(state);

	let listener = bind_with_fallback(&api_config.host, api_config.port).await?;
	tracing::info!("Operator API listening on {}", listener.local_addr()?);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown.cancelled_owned())
		.await?;

	Ok(())
}

/// Binds the listener, retrying once on the next port when taken.
async fn bind_with_fallback(host: &str, port: u16) -> Result<TcpListener, std::io::Error> {
	match TcpListener::bind((host, port)).await {
		Ok(listener) => Ok(listener),
		Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
			let Some(fallback) = port.checked_add(1) else {
				return Err(e);
			};
			tracing::warn!(port, fallback, "Port in use, retrying on next port");
			TcpListener::bind((host, fallback)).await
		},
		Err(e) => Err(e),
	}
}

/// Serves the static operator view.
async fn dashboard() -> Html<&'static str> {
	Html(include_str!("../static/dashboard.html"))
}
