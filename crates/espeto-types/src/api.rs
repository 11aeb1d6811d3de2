//! API types for the operator HTTP API.
//!
//! This module defines the request and response types exchanged with the
//! dashboard, plus the structured error type with its HTTP status mapping.
//! Field names are the Portuguese wire names the dashboard expects.

use crate::{Order, OrderStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Wire representation of an order as served by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWire {
	/// Order code (`ESP` + nine digits).
	pub codigo: String,
	/// Customer chat identifier.
	pub numero: String,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Creation timestamp, Unix seconds.
	pub timestamp: u64,
	/// Verbatim order message.
	pub mensagem: String,
}

impl From<Order> for OrderWire {
	fn from(order: Order) -> Self {
		Self {
			codigo: order.code,
			numero: order.customer,
			status: order.status,
			timestamp: order.created_at,
			mensagem: order.raw_text,
		}
	}
}

/// Response for listing all active orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOrdersResponse {
	pub success: bool,
	pub pedidos: Vec<OrderWire>,
}

/// Response for fetching a single order by code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrderResponse {
	pub success: bool,
	pub pedido: OrderWire,
}

/// Request body for the status-update endpoint.
///
/// All three fields are required; they are optional here so that a missing
/// field surfaces as a 400 with a readable message instead of a
/// deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
	/// Customer chat identifier.
	pub numero: Option<String>,
	/// Target status, wire name.
	pub status: Option<String>,
	/// Order code, must match the stored order.
	pub codigo: Option<String>,
}

/// Response for a successful status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
	pub success: bool,
	pub message: String,
	/// Echo of the requested status. When the request was `entregue` the
	/// effective stored status is `finalizado` and the entry is gone.
	#[serde(rename = "novoStatus")]
	pub novo_status: String,
}

/// Aggregate counters over the active orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStats {
	/// Number of active orders.
	pub total_pedidos: usize,
	/// Count of active orders grouped by status.
	pub por_status: BTreeMap<OrderStatus, usize>,
	/// Orders created within the last hour.
	pub ultima_hora: usize,
}

/// Response for the statistics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
	pub success: bool,
	pub stats: OrderStats,
}

/// Response for the liveness probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
	/// Always "ok" when the process answers.
	pub status: String,
	/// Current time, RFC 3339.
	pub timestamp: String,
	/// Number of active orders in the store.
	pub pedidos_ativos: usize,
	/// Seconds since process start.
	pub uptime: u64,
}

/// JSON error body for failed API calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub success: bool,
	pub message: String,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
	/// Missing or invalid request fields (400).
	BadRequest { message: String },
	/// No order matches the given customer/code (404).
	NotFound { message: String },
	/// Unexpected failure inside the service (500).
	InternalServerError { message: String },
}

impl ApiError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			ApiError::BadRequest { .. } => 400,
			ApiError::NotFound { .. } => 404,
			ApiError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to the JSON error body.
	pub fn to_error_response(&self) -> ErrorResponse {
		let message = match self {
			ApiError::BadRequest { message }
			| ApiError::NotFound { message }
			| ApiError::InternalServerError { message } => message.clone(),
		};
		ErrorResponse {
			success: false,
			message,
		}
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ApiError::BadRequest { message } => write!(f, "Bad Request: {}", message),
			ApiError::NotFound { message } => write!(f, "Not Found: {}", message),
			ApiError::InternalServerError { message } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for ApiError {}

impl axum::response::IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = match self.status_code() {
			400 => StatusCode::BAD_REQUEST,
			404 => StatusCode::NOT_FOUND,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};

		(status, Json(self.to_error_response())).into_response()
	}
}
