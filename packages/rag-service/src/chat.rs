use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Assistant,
}
impl Role {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::User => "user",
			Self::Assistant => "assistant",
		}
	}
}
impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
	pub role: Role,
	pub content: String,
}
impl Message {
	pub fn user(content: impl Into<String>) -> Self {
		Self { role: Role::User, content: content.into() }
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self { role: Role::Assistant, content: content.into() }
	}
}

/// Full transcript sent by the client. The last message is the turn to answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
	pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
	pub response: String,
}

/// Splits a transcript into the latest query and the history that precedes it.
pub fn split_request(request: &ChatRequest) -> Result<(&str, &[Message])> {
	let Some((last, history)) = request.messages.split_last() else {
		return Err(Error::InvalidRequest { message: "messages must be non-empty.".to_string() });
	};

	if last.content.trim().is_empty() {
		return Err(Error::InvalidRequest {
			message: "The last message must have non-empty content.".to_string(),
		});
	}

	Ok((last.content.as_str(), history))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn last_message_is_the_query() {
		let request = ChatRequest {
			messages: vec![
				Message::user("What is Rust?"),
				Message::assistant("A language."),
				Message::user("Who made it?"),
			],
		};
		let (query, history) = split_request(&request).expect("split failed");

		assert_eq!(query, "Who made it?");
		assert_eq!(history.len(), 2);
		assert_eq!(history[1].role, Role::Assistant);
	}

	#[test]
	fn empty_transcript_is_rejected() {
		let err = split_request(&ChatRequest { messages: vec![] }).expect_err("expected error");

		assert!(matches!(err, Error::InvalidRequest { .. }));
	}

	#[test]
	fn blank_query_is_rejected() {
		let request = ChatRequest { messages: vec![Message::user("  \n")] };

		assert!(split_request(&request).is_err());
	}

	#[test]
	fn roles_use_lowercase_wire_names() {
		let json = serde_json::to_value(Message::assistant("hi")).expect("serialize failed");

		assert_eq!(json["role"], "assistant");

		let parsed: Message = serde_json::from_str(r#"{"role":"user","content":"x"}"#)
			.expect("deserialize failed");

		assert_eq!(parsed.role, Role::User);
		assert!(serde_json::from_str::<Message>(r#"{"role":"system","content":"x"}"#).is_err());
	}
}
