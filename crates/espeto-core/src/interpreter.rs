//! Chat command interpreter.
//!
//! Turns inbound chat text into engine calls and builds the reply. Every
//! engine failure is translated into a single user-facing message; nothing
//! from the inside (error chains, store details) reaches the customer.

use crate::engine::{Engine, EngineError};
use espeto_types::{InboundMessage, OutboundMessage};
use std::str::FromStr;
use std::sync::Arc;

/// Trigger phrase marking free text as a new order, matched case-insensitively.
pub const ORDER_TRIGGER: &str = "PEDIDO - ESPETINHOS";

/// Recognized slash commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	Confirmar,
	Cancelar,
	Status,
	Cardapio,
	Ajuda,
}

impl FromStr for Command {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"confirmar" => Ok(Self::Confirmar),
			"cancelar" => Ok(Self::Cancelar),
			"status" => Ok(Self::Status),
			"cardapio" => Ok(Self::Cardapio),
			"ajuda" => Ok(Self::Ajuda),
			_ => Err(()),
		}
	}
}

/// Interprets inbound messages against the lifecycle engine.
pub struct Interpreter {
	engine: Arc<Engine>,
}

impl Interpreter {
	/// Creates an interpreter over the given engine.
	pub fn new(engine: Arc<Engine>) -> Self {
		Self { engine }
	}

	/// Handles one inbound message and returns the reply to send.
	///
	/// Dispatch order: slash commands first, then the order trigger phrase,
	/// otherwise the welcome reply.
	pub async fn handle(&self, message: &InboundMessage) -> OutboundMessage {
		let body = message.body.trim();

		let reply = if let Some(rest) = body.strip_prefix('/') {
			self.handle_command(&message.from, rest).await
		} else if body.to_uppercase().contains(ORDER_TRIGGER) {
			self.handle_new_order(&message.from, body).await
		} else {
			self.engine.replies().welcome()
		};

		OutboundMessage::new(message.from.clone(), reply)
	}

	/// Dispatches a slash command.
	async fn handle_command(&self, customer: &str, raw: &str) -> String {
		let name = raw.split_whitespace().next().unwrap_or("");
		let replies = self.engine.replies();

		match Command::from_str(name) {
			Ok(Command::Confirmar) => match self.engine.confirm(customer).await {
				Ok(order) => replies.order_confirmed(&order.code),
				Err(e) => self.reply_for_error(customer, "confirmar", e),
			},
			Ok(Command::Cancelar) => match self.engine.cancel(customer).await {
				Ok(()) => replies.order_cancelled(),
				Err(e) => self.reply_for_error(customer, "cancelar", e),
			},
			Ok(Command::Status) => match self.engine.status_of(customer).await {
				Ok(order) => replies.status_report(&order.code, order.status),
				Err(e) => self.reply_for_error(customer, "status", e),
			},
			Ok(Command::Cardapio) => replies.cardapio(),
			Ok(Command::Ajuda) => replies.ajuda(),
			Err(()) => {
				tracing::debug!(customer, command = name, "Unrecognized command");
				replies.unknown_command()
			},
		}
	}

	/// Creates a new order from trigger-phrase text.
	async fn handle_new_order(&self, customer: &str, body: &str) -> String {
		match self.engine.create_order(customer, body).await {
			Ok(code) => self.engine.replies().order_received(&code),
			Err(e) => self.reply_for_error(customer, "pedido", e),
		}
	}

	/// Maps an engine failure to its user-facing reply.
	///
	/// Expected rejections log at debug; anything else is a real fault and
	/// logs at warn with the attempted command for diagnosis.
	fn reply_for_error(&self, customer: &str, attempted: &str, error: EngineError) -> String {
		let replies = self.engine.replies();
		match error {
			EngineError::NotFound => {
				tracing::debug!(customer, attempted, "No order for customer");
				replies.no_order()
			},
			EngineError::LimitExceeded { limit } => {
				tracing::debug!(customer, attempted, limit, "Active order limit reached");
				replies.limit_reached()
			},
			EngineError::AlreadyConfirmed => {
				tracing::debug!(customer, attempted, "Order already confirmed");
				replies.already_confirmed()
			},
			EngineError::AlreadyFinalized => {
				tracing::debug!(customer, attempted, "Order already finalized");
				replies.cannot_cancel()
			},
			EngineError::InvalidStatus(_) | EngineError::Store(_) => {
				tracing::warn!(customer, attempted, error = %error, "Command failed");
				replies.generic_error()
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::EngineSettings;
	use crate::replies::Replies;
	use espeto_store::implementations::memory::MemoryStore;
	use espeto_types::OrderStatus;
	use std::time::Duration;

	fn test_interpreter() -> (Interpreter, Arc<Engine>) {
		let engine = Arc::new(Engine::new(
			Arc::new(MemoryStore::new()),
			EngineSettings {
				max_active_per_customer: 3,
				timeout: Duration::from_secs(30 * 60),
			},
			Replies::new("https://example.com/cardapio", "+55 68 9000-0000"),
		));
		(Interpreter::new(engine.clone()), engine)
	}

	fn message(from: &str, body: &str) -> InboundMessage {
		InboundMessage {
			from: from.to_string(),
			body: body.to_string(),
		}
	}

	#[test]
	fn test_command_parse_case_insensitive() {
		assert_eq!("CONFIRMAR".parse::<Command>(), Ok(Command::Confirmar));
		assert_eq!("Cardapio".parse::<Command>(), Ok(Command::Cardapio));
		assert!("pedido".parse::<Command>().is_err());
	}

	#[tokio::test]
	async fn test_order_flow_scenario() {
		let (interpreter, engine) = test_interpreter();

		// New order via trigger phrase
		let reply = interpreter
			.handle(&message("55999990000", "PEDIDO - ESPETINHOS\n1x combo"))
			.await;
		assert_eq!(reply.to, "55999990000");
		assert!(reply.body.contains("PEDIDO RECEBIDO"));

		let code_start = reply.body.find("ESP").expect("reply carries a code");
		let code = &reply.body[code_start..code_start + 12];
		assert!(code[3..].chars().all(|c| c.is_ascii_digit()));

		let order = engine.status_of("55999990000").await.unwrap();
		assert_eq!(order.status, OrderStatus::Iniciado);
		assert_eq!(order.code, code);

		// Customer confirms
		let reply = interpreter.handle(&message("55999990000", "/confirmar")).await;
		assert!(reply.body.contains("Pedido confirmado"));
		let order = engine.status_of("55999990000").await.unwrap();
		assert_eq!(order.status, OrderStatus::Confirmado);

		// Operator delivers: order disappears
		let change = engine
			.set_status("55999990000", code, "entregue")
			.await
			.unwrap();
		assert!(change.notification.is_some());
		assert!(engine.status_of("55999990000").await.is_err());
	}

	#[tokio::test]
	async fn test_trigger_phrase_case_insensitive() {
		let (interpreter, engine) = test_interpreter();

		let reply = interpreter
			.handle(&message("55999990000", "pedido - espetinhos\n2x frango"))
			.await;
		assert!(reply.body.contains("PEDIDO RECEBIDO"));
		assert!(engine.status_of("55999990000").await.is_ok());
	}

	#[tokio::test]
	async fn test_free_text_gets_welcome() {
		let (interpreter, _engine) = test_interpreter();

		let reply = interpreter.handle(&message("55999990000", "oi, tudo bem?")).await;
		assert!(reply.body.contains("Bem-vindo"));
		assert!(reply.body.contains("https://example.com/cardapio"));
	}

	#[tokio::test]
	async fn test_unknown_command_lists_available() {
		let (interpreter, _engine) = test_interpreter();

		let reply = interpreter.handle(&message("55999990000", "/pix")).await;
		assert!(reply.body.contains("Comando não reconhecido"));
		assert!(reply.body.contains("/cardapio"));
	}

	#[tokio::test]
	async fn test_confirm_without_order() {
		let (interpreter, _engine) = test_interpreter();

		let reply = interpreter.handle(&message("55999990000", "/confirmar")).await;
		assert!(reply.body.contains("Nenhum pedido encontrado"));
	}

	#[tokio::test]
	async fn test_status_reports_current_state() {
		let (interpreter, _engine) = test_interpreter();

		interpreter
			.handle(&message("55999990000", "PEDIDO - ESPETINHOS\n1x combo"))
			.await;
		let reply = interpreter.handle(&message("55999990000", "/status")).await;
		assert!(reply.body.contains("Status do Pedido"));
		assert!(reply.body.contains("iniciado"));
	}

	#[tokio::test]
	async fn test_cancel_flow() {
		let (interpreter, engine) = test_interpreter();

		interpreter
			.handle(&message("55999990000", "PEDIDO - ESPETINHOS\n1x combo"))
			.await;
		let reply = interpreter.handle(&message("55999990000", "/cancelar")).await;
		assert!(reply.body.contains("cancelado com sucesso"));
		assert!(engine.status_of("55999990000").await.is_err());
	}
}
