use rag_providers::Passage;

use crate::chat::Message;

const RESPONSE_INSTRUCTIONS: &str = "\
1. Provide clear, well-structured answers using normal text formatting.
2. Use simple paragraphs separated by line breaks.
3. If listing items, use simple bullet points with dashes (-) or numbers.
4. Do NOT use markdown headers (# ## ###) or excessive bold formatting.
5. Keep the text readable with normal font weight.";

/// Renders hits as `Document {position}: {text}` blocks separated by blank lines.
pub fn format_context(passages: &[Passage]) -> String {
	passages
		.iter()
		.map(|passage| format!("Document {}: {}", passage.position, passage.text))
		.collect::<Vec<_>>()
		.join("\n\n")
}

pub fn format_history(history: &[Message]) -> String {
	history
		.iter()
		.map(|message| format!("{}: {}", message.role, message.content))
		.collect::<Vec<_>>()
		.join("\n")
}

pub fn build_prompt(context: &str, history: &str, query: &str) -> String {
	format!(
		"
### Knowledge Base:
{context}

### Conversation History:
{history}

### User Query:
{query}

### Response Instructions:
{RESPONSE_INSTRUCTIONS}

### Response:
"
	)
}
