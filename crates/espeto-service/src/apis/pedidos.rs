//! Order endpoints for the operator dashboard.
//!
//! Handlers read and mutate order state through the shared engine and
//! translate engine failures into the structured JSON errors the dashboard
//! expects. The status-update handler dispatches the customer notification
//! only after the engine has committed the change.

use crate::server::AppState;
use axum::extract::{Path, State};
use axum::response::Json;
use espeto_core::EngineError;
use espeto_types::{
	ApiError, GetOrderResponse, HealthResponse, ListOrdersResponse, OrderWire, OutboundMessage,
	StatsResponse, UpdateStatusRequest, UpdateStatusResponse,
};

/// Maps unexpected engine failures to a 500.
fn internal(error: EngineError) -> ApiError {
	tracing::error!(error = %error, "Engine operation failed");
	ApiError::InternalServerError {
		message: error.to_string(),
	}
}

/// Handles GET /api/pedidos requests.
///
/// Returns every active order, oldest first.
pub async fn list_orders(
	State(state): State<AppState>,
) -> Result<Json<ListOrdersResponse>, ApiError> {
	let orders = state.engine.list_orders().await.map_err(internal)?;

	Ok(Json(ListOrdersResponse {
		success: true,
		pedidos: orders.into_iter().map(OrderWire::from).collect(),
	}))
}

/// Handles GET /api/pedido/{codigo} requests.
///
/// Looks an active order up by code; a linear scan over the store.
pub async fn get_order(
	Path(codigo): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<GetOrderResponse>, ApiError> {
	match state.engine.find_by_code(&codigo).await {
		Ok(order) => Ok(Json(GetOrderResponse {
			success: true,
			pedido: order.into(),
		})),
		Err(EngineError::NotFound) => Err(ApiError::NotFound {
			message: "Pedido não encontrado".to_string(),
		}),
		Err(e) => Err(internal(e)),
	}
}

/// Handles POST /api/pedido/status requests.
///
/// Requires `numero`, `status` and `codigo`; the engine additionally demands
/// that customer and code match the stored order. On success the selected
/// notification is dispatched through the sink after the commit; a delivery
/// failure does not fail the request.
pub async fn update_status(
	State(state): State<AppState>,
	Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, ApiError> {
	let (numero, status, codigo) = match (request.numero, request.status, request.codigo) {
		(Some(numero), Some(status), Some(codigo)) => (numero, status, codigo),
		_ => {
			return Err(ApiError::BadRequest {
				message: "Número, status e código são obrigatórios".to_string(),
			})
		},
	};

	let change = match state.engine.set_status(&numero, &codigo, &status).await {
		Ok(change) => change,
		Err(EngineError::InvalidStatus(_)) => {
			return Err(ApiError::BadRequest {
				message: "Status inválido".to_string(),
			})
		},
		Err(EngineError::NotFound) => {
			return Err(ApiError::NotFound {
				message: "Pedido não encontrado".to_string(),
			})
		},
		Err(e) => return Err(internal(e)),
	};

	// The change is committed; notify and answer regardless of delivery
	if let Some(notification) = change.notification {
		state
			.outbound
			.dispatch(&OutboundMessage::new(numero, notification))
			.await;
	}

	Ok(Json(UpdateStatusResponse {
		success: true,
		message: "Status atualizado com sucesso".to_string(),
		novo_status: change.requested.to_string(),
	}))
}

/// Handles GET /api/stats requests.
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
	let stats = state.engine.stats().await.map_err(internal)?;

	Ok(Json(StatsResponse {
		success: true,
		stats,
	}))
}

/// Handles GET /api/health requests.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
	let pedidos_ativos = state.engine.active_count().await.unwrap_or(0);

	Json(HealthResponse {
		status: "ok".to_string(),
		timestamp: chrono::Utc::now().to_rfc3339(),
		pedidos_ativos,
		uptime: state.started_at.elapsed().as_secs(),
	})
}
