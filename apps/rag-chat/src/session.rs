use serde::Serialize;
use time::{OffsetDateTime, macros::format_description};

use rag_service::{Message, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatStats {
	pub total: usize,
	pub user: usize,
	pub assistant: usize,
}

#[derive(Debug, Serialize)]
pub struct ChatExport {
	pub timestamp: String,
	pub messages: Vec<Message>,
	pub total_messages: usize,
}

/// Client-side transcript plus the streaming toggle.
#[derive(Debug)]
pub struct ChatSession {
	messages: Vec<Message>,
	pub streaming: bool,
}
impl ChatSession {
	pub fn new(streaming: bool) -> Self {
		Self { messages: Vec::new(), streaming }
	}

	pub fn messages(&self) -> &[Message] {
		&self.messages
	}

	pub fn push_user(&mut self, content: impl Into<String>) {
		self.messages.push(Message::user(content));
	}

	pub fn push_assistant(&mut self, content: impl Into<String>) {
		self.messages.push(Message::assistant(content));
	}

	/// Drops a trailing user turn that never got an answer.
	pub fn discard_unanswered(&mut self) -> Option<Message> {
		match self.messages.last() {
			Some(last) if last.role == Role::User => self.messages.pop(),
			_ => None,
		}
	}

	pub fn clear(&mut self) {
		self.messages.clear();
	}

	pub fn stats(&self) -> ChatStats {
		let total = self.messages.len();
		let user = self.messages.iter().filter(|m| m.role == Role::User).count();

		ChatStats { total, user, assistant: total - user }
	}

	pub fn export(&self, now: OffsetDateTime) -> Result<ChatExport, time::error::Format> {
		let timestamp = now.format(&format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))?;

		Ok(ChatExport {
			timestamp,
			messages: self.messages.clone(),
			total_messages: self.messages.len(),
		})
	}
}

pub fn export_file_name(now: OffsetDateTime) -> Result<String, time::error::Format> {
	let stamp = now.format(&format_description!("[year][month][day]_[hour][minute][second]"))?;

	Ok(format!("chat_export_{stamp}.json"))
}
