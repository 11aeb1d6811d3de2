//! Chat message types for the transport seams.
//!
//! The real chat network (connection, authentication, message delivery) is an
//! external collaborator; the service only sees these two shapes.

use serde::{Deserialize, Serialize};

/// A text message received from a chat participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
	/// Chat identifier of the sender.
	pub from: String,
	/// Message text as typed by the customer.
	pub body: String,
}

/// A text message to be delivered to a chat participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
	/// Chat identifier of the recipient.
	pub to: String,
	/// Message text, Portuguese copy with chat markup.
	pub body: String,
}

impl OutboundMessage {
	/// Convenience constructor for replies and notifications.
	pub fn new(to: impl Into<String>, body: impl Into<String>) -> Self {
		Self {
			to: to.into(),
			body: body.into(),
		}
	}
}
