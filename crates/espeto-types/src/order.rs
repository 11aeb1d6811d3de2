//! Order domain types for the intake service.
//!
//! This module defines the order record kept in the store and the lifecycle
//! status enumeration that the engine transitions orders through.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A customer's in-progress purchase request, tracked by code and status.
///
/// Orders are keyed by the customer identifier in the store, which enforces
/// at most one entry per customer at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique order code (`ESP` followed by nine digits). Immutable after creation.
	pub code: String,
	/// Chat identifier of the customer that placed the order.
	pub customer: String,
	/// Current lifecycle status. Mutated only through the engine.
	pub status: OrderStatus,
	/// Creation timestamp in Unix seconds, used for expiry and statistics.
	pub created_at: u64,
	/// Verbatim inbound message that created the order. Not parsed further.
	pub raw_text: String,
}

/// Lifecycle status of an order.
///
/// The wire and store representation is the snake_case Portuguese name,
/// matching what the dashboard and the status-update endpoint exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	/// Order received, waiting for the customer to confirm.
	Iniciado,
	/// Customer confirmed the order.
	Confirmado,
	/// Kitchen is preparing the order.
	EmPreparo,
	/// Order ready, courier about to leave.
	Pronto,
	/// Courier is on the way.
	EmEntrega,
	/// Order handed to the customer. Auto-transitions to `Finalizado`.
	Entregue,
	/// Cancelled by the customer. Terminal.
	Cancelado,
	/// Completed and removed from the store. Terminal.
	Finalizado,
}

impl OrderStatus {
	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Iniciado => "iniciado",
			OrderStatus::Confirmado => "confirmado",
			OrderStatus::EmPreparo => "em_preparo",
			OrderStatus::Pronto => "pronto",
			OrderStatus::EmEntrega => "em_entrega",
			OrderStatus::Entregue => "entregue",
			OrderStatus::Cancelado => "cancelado",
			OrderStatus::Finalizado => "finalizado",
		}
	}

	/// Returns true for statuses that end the lifecycle.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Cancelado | OrderStatus::Finalizado)
	}

	/// Returns an iterator over all status variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Iniciado,
			Self::Confirmado,
			Self::EmPreparo,
			Self::Pronto,
			Self::EmEntrega,
			Self::Entregue,
			Self::Cancelado,
			Self::Finalizado,
		]
		.into_iter()
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderStatus {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"iniciado" => Ok(Self::Iniciado),
			"confirmado" => Ok(Self::Confirmado),
			"em_preparo" => Ok(Self::EmPreparo),
			"pronto" => Ok(Self::Pronto),
			"em_entrega" => Ok(Self::EmEntrega),
			"entregue" => Ok(Self::Entregue),
			"cancelado" => Ok(Self::Cancelado),
			"finalizado" => Ok(Self::Finalizado),
			_ => Err(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_round_trip() {
		for status in OrderStatus::all() {
			let parsed: OrderStatus = status.as_str().parse().unwrap();
			assert_eq!(parsed, status);
		}
	}

	#[test]
	fn test_unknown_status_rejected() {
		assert!("entregando".parse::<OrderStatus>().is_err());
		assert!("".parse::<OrderStatus>().is_err());
	}

	#[test]
	fn test_terminal_statuses() {
		assert!(OrderStatus::Cancelado.is_terminal());
		assert!(OrderStatus::Finalizado.is_terminal());
		assert!(!OrderStatus::Iniciado.is_terminal());
		assert!(!OrderStatus::Entregue.is_terminal());
	}

	#[test]
	fn test_wire_serialization() {
		let json = serde_json::to_string(&OrderStatus::EmPreparo).unwrap();
		assert_eq!(json, "\"em_preparo\"");
	}
}
