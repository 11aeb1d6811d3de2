//! Customer-facing reply templates.
//!
//! All chat copy lives here, in Portuguese with the chat network's `*bold*`
//! markup, parameterized by the shop's menu URL and contact string. Nothing
//! outside this module builds reply text.

use espeto_types::OrderStatus;

/// Reply and notification templates for one shop.
#[derive(Debug, Clone)]
pub struct Replies {
	menu_url: String,
	contact: String,
}

impl Replies {
	/// Creates templates for the given menu URL and contact string.
	pub fn new(menu_url: impl Into<String>, contact: impl Into<String>) -> Self {
		Self {
			menu_url: menu_url.into(),
			contact: contact.into(),
		}
	}

	/// List of available commands, shared by several replies.
	fn command_list(&self) -> &'static str {
		"• /cardapio - Ver cardápio\n\
		 • /confirmar - Confirmar pedido\n\
		 • /cancelar - Cancelar pedido\n\
		 • /status - Verificar status\n\
		 • /ajuda - Ver ajuda"
	}

	/// Greeting for free text that is neither a command nor an order.
	pub fn welcome(&self) -> String {
		format!(
			"🍖 *Bem-vindo ao nosso atendimento!* 🍖\n\n\
			 Para fazer um pedido, acesse nosso cardápio digital:\n{}\n\n\
			 Depois, copie os itens desejados e envie no formato:\n\
			 *PEDIDO - ESPETINHOS*\n[Seus itens aqui]\n\n\
			 Comandos disponíveis:\n{}\n\n\
			 📞 *Contato:* {}",
			self.menu_url,
			self.command_list(),
			self.contact
		)
	}

	/// Reply to /cardapio.
	pub fn cardapio(&self) -> String {
		format!(
			"🍖 *Nosso Cardápio* 🍖\n\n\
			 Acesse nosso cardápio digital: {}\n\n\
			 Para fazer um pedido, copie os itens desejados e envie no formato:\n\
			 *PEDIDO - ESPETINHOS*\n[Seus itens aqui]\n\n\
			 📞 *Contato:* {}",
			self.menu_url, self.contact
		)
	}

	/// Reply to /ajuda.
	pub fn ajuda(&self) -> String {
		format!(
			"📱 *Comandos Disponíveis*\n\n{}\n\n\
			 Para fazer um pedido, envie:\n\
			 *PEDIDO - ESPETINHOS*\n[Seus itens aqui]",
			self.command_list()
		)
	}

	/// Reply to an unrecognized slash command.
	pub fn unknown_command(&self) -> String {
		format!(
			"❌ Comando não reconhecido.\n\n\
			 Comandos disponíveis:\n{}\n\n\
			 Ou acesse nosso cardápio: {}",
			self.command_list(),
			self.menu_url
		)
	}

	/// Acknowledgement of a newly created order.
	pub fn order_received(&self, code: &str) -> String {
		format!(
			"🍖 *PEDIDO RECEBIDO!* 🍖\n\n\
			 Código do pedido: *{}*\n\n\
			 Para confirmar seu pedido, envie: /confirmar\n\
			 Para cancelar seu pedido, envie: /cancelar\n\
			 Para verificar o status, envie: /status\n\n\
			 Aguarde a confirmação do estabelecimento.",
			code
		)
	}

	/// Confirmation acknowledgement.
	pub fn order_confirmed(&self, code: &str) -> String {
		format!(
			"✅ Pedido confirmado!\n\
			 Código do pedido: *{}*\n\n\
			 Em breve você receberá uma mensagem quando o pedido estiver pronto para entrega.",
			code
		)
	}

	/// Cancellation acknowledgement.
	pub fn order_cancelled(&self) -> String {
		"❌ Pedido cancelado com sucesso.".to_string()
	}

	/// Status report for /status.
	pub fn status_report(&self, code: &str, status: OrderStatus) -> String {
		format!(
			"📊 *Status do Pedido*\n\
			 Código: *{}*\n\
			 Status: {}",
			code, status
		)
	}

	/// Rejection when the customer already holds the maximum active orders.
	pub fn limit_reached(&self) -> String {
		"❌ Você já tem o número máximo de pedidos ativos.\n\
		 Por favor, aguarde a finalização de um pedido ou cancele um existente."
			.to_string()
	}

	/// Rejection when no order exists for the customer.
	pub fn no_order(&self) -> String {
		"❌ Nenhum pedido encontrado para este número.".to_string()
	}

	/// Rejection when the order was already confirmed.
	pub fn already_confirmed(&self) -> String {
		"❌ Este pedido já foi confirmado anteriormente.".to_string()
	}

	/// Rejection when cancelling a finalized order.
	pub fn cannot_cancel(&self) -> String {
		"❌ Não é possível cancelar um pedido já finalizado.".to_string()
	}

	/// Fallback reply when an operation fails unexpectedly.
	pub fn generic_error(&self) -> String {
		"❌ Ocorreu um erro ao processar sua mensagem. Por favor, tente novamente.".to_string()
	}

	/// One-shot notice sent when an order expires by inactivity.
	pub fn expired(&self, code: &str) -> String {
		format!(
			"⚠️ *Aviso de Timeout*\n\n\
			 Seu pedido {} expirou por inatividade.\n\
			 Por favor, faça um novo pedido se desejar.",
			code
		)
	}

	/// Notification template selected by a status update, if any.
	///
	/// Only the operator-driven statuses notify the customer; the remaining
	/// transitions are acknowledged through command replies.
	pub fn notification_for(&self, status: OrderStatus) -> Option<String> {
		match status {
			OrderStatus::EmPreparo => Some(
				"🍳 *Seu pedido está sendo preparado!*\n\n\
				 Assim que estiver pronto, você será notificado."
					.to_string(),
			),
			OrderStatus::Pronto => Some(
				"✅ *Seu pedido está pronto!*\n\n\
				 O entregador sairá em instantes para fazer a entrega."
					.to_string(),
			),
			OrderStatus::EmEntrega => Some(
				"🛵 *Seu pedido está a caminho!*\n\n\
				 O entregador saiu para fazer a entrega."
					.to_string(),
			),
			OrderStatus::Entregue => Some(format!(
				"🎉 *Pedido entregue com sucesso!*\n\n\
				 Obrigado por escolher nossos serviços!\n\
				 Esperamos que você tenha gostado.\n\n\
				 Para fazer um novo pedido, envie:\n\
				 *PEDIDO - ESPETINHOS*\n[Seus itens aqui]\n\n\
				 📞 *Contato:* {}",
				self.contact
			)),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn replies() -> Replies {
		Replies::new("https://example.com/cardapio", "+55 68 9000-0000")
	}

	#[test]
	fn test_welcome_carries_menu_and_contact() {
		let text = replies().welcome();
		assert!(text.contains("https://example.com/cardapio"));
		assert!(text.contains("+55 68 9000-0000"));
		assert!(text.contains("PEDIDO - ESPETINHOS"));
	}

	#[test]
	fn test_notifications_only_for_operator_statuses() {
		let replies = replies();
		assert!(replies.notification_for(OrderStatus::EmPreparo).is_some());
		assert!(replies.notification_for(OrderStatus::Pronto).is_some());
		assert!(replies.notification_for(OrderStatus::EmEntrega).is_some());
		assert!(replies.notification_for(OrderStatus::Entregue).is_some());

		assert!(replies.notification_for(OrderStatus::Iniciado).is_none());
		assert!(replies.notification_for(OrderStatus::Confirmado).is_none());
		assert!(replies.notification_for(OrderStatus::Cancelado).is_none());
		assert!(replies.notification_for(OrderStatus::Finalizado).is_none());
	}

	#[test]
	fn test_delivered_notification_invites_reorder() {
		let text = replies()
			.notification_for(OrderStatus::Entregue)
			.unwrap();
		assert!(text.contains("PEDIDO - ESPETINHOS"));
		assert!(text.contains("+55 68 9000-0000"));
	}
}
