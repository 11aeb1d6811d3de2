//! Order lifecycle transition rules.
//!
//! The customer-facing lifecycle moves through a linear chain with
//! cancellation reachable from every non-finalized state:
//! iniciado -> confirmado -> em_preparo -> pronto -> em_entrega -> entregue
//! -> finalizado. The operator status-update path intentionally bypasses this
//! table (last write wins); only the chat operations consult it.

use espeto_types::OrderStatus;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

// Static transition table - each state maps to allowed next states
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	use OrderStatus::*;

	let mut m = HashMap::new();
	m.insert(Iniciado, HashSet::from([Confirmado, Cancelado]));
	m.insert(Confirmado, HashSet::from([EmPreparo, Cancelado]));
	m.insert(EmPreparo, HashSet::from([Pronto, Cancelado]));
	m.insert(Pronto, HashSet::from([EmEntrega, Cancelado]));
	m.insert(EmEntrega, HashSet::from([Entregue, Cancelado]));
	m.insert(Entregue, HashSet::from([Finalizado, Cancelado]));
	m.insert(Cancelado, HashSet::new()); // terminal
	m.insert(Finalizado, HashSet::new()); // terminal
	m
});

/// Checks if a lifecycle transition is valid.
pub fn is_valid_transition(from: &OrderStatus, to: &OrderStatus) -> bool {
	TRANSITIONS
		.get(from)
		.is_some_and(|allowed| allowed.contains(to))
}

#[cfg(test)]
mod tests {
	use super::*;
	use espeto_types::OrderStatus::*;

	#[test]
	fn test_linear_chain() {
		assert!(is_valid_transition(&Iniciado, &Confirmado));
		assert!(is_valid_transition(&Confirmado, &EmPreparo));
		assert!(is_valid_transition(&EmPreparo, &Pronto));
		assert!(is_valid_transition(&Pronto, &EmEntrega));
		assert!(is_valid_transition(&EmEntrega, &Entregue));
		assert!(is_valid_transition(&Entregue, &Finalizado));
	}

	#[test]
	fn test_no_skipping_ahead() {
		assert!(!is_valid_transition(&Iniciado, &EmPreparo));
		assert!(!is_valid_transition(&Confirmado, &Entregue));
	}

	#[test]
	fn test_cancel_from_any_non_finalized_state() {
		for from in [Iniciado, Confirmado, EmPreparo, Pronto, EmEntrega, Entregue] {
			assert!(is_valid_transition(&from, &Cancelado), "{from} -> cancelado");
		}
		assert!(!is_valid_transition(&Finalizado, &Cancelado));
	}

	#[test]
	fn test_terminal_states() {
		for to in OrderStatus::all() {
			assert!(!is_valid_transition(&Finalizado, &to));
			assert!(!is_valid_transition(&Cancelado, &to));
		}
	}
}
