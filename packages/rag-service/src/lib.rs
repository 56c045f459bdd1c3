pub mod chat;
pub mod prompt;
pub mod stream;

mod error;

pub use chat::{ChatRequest, Message, QueryResponse, Role, split_request};
pub use error::{Error, Result};
pub use rag_providers::Passage;
pub use stream::{AnswerStream, answer_stream, word_chunks};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use rag_config::{Aws, Config, KnowledgeBase, Llm};
use rag_providers::{knowledge_base, llm};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait KnowledgeBaseProvider
where
	Self: Send + Sync,
{
	fn retrieve<'a>(
		&'a self,
		aws: &'a Aws,
		cfg: &'a KnowledgeBase,
		query: &'a str,
	) -> BoxFuture<'a, rag_providers::Result<Vec<Passage>>>;
}

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		aws: &'a Aws,
		cfg: &'a Llm,
		prompt: &'a str,
	) -> BoxFuture<'a, rag_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub knowledge_base: Arc<dyn KnowledgeBaseProvider>,
	pub llm: Arc<dyn LlmProvider>,
}
impl Providers {
	pub fn new(knowledge_base: Arc<dyn KnowledgeBaseProvider>, llm: Arc<dyn LlmProvider>) -> Self {
		Self { knowledge_base, llm }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(BedrockProviders);

		Self { knowledge_base: provider.clone(), llm: provider }
	}
}

struct BedrockProviders;
impl KnowledgeBaseProvider for BedrockProviders {
	fn retrieve<'a>(
		&'a self,
		aws: &'a Aws,
		cfg: &'a KnowledgeBase,
		query: &'a str,
	) -> BoxFuture<'a, rag_providers::Result<Vec<Passage>>> {
		Box::pin(knowledge_base::retrieve(aws, cfg, query))
	}
}
impl LlmProvider for BedrockProviders {
	fn generate<'a>(
		&'a self,
		aws: &'a Aws,
		cfg: &'a Llm,
		prompt: &'a str,
	) -> BoxFuture<'a, rag_providers::Result<String>> {
		Box::pin(llm::generate(aws, cfg, prompt))
	}
}

pub struct RagService {
	pub cfg: Config,
	pub providers: Providers,
}
impl RagService {
	pub fn new(cfg: Config) -> Self {
		Self { cfg, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}

	/// Retrieves context for `query` alone, then asks the model with the history folded into the
	/// prompt.
	pub async fn answer(&self, query: &str, history: &[Message]) -> Result<String> {
		let passages = self
			.providers
			.knowledge_base
			.retrieve(&self.cfg.aws, &self.cfg.knowledge_base, query)
			.await
			.map_err(|err| {
				tracing::error!(error = %err, "Knowledge base retrieval failed.");

				Error::Retrieval { message: err.to_string() }
			})?;

		tracing::info!(hits = passages.len(), "Knowledge base retrieval completed.");

		let prompt = prompt::build_prompt(
			&prompt::format_context(&passages),
			&prompt::format_history(history),
			query,
		);

		tracing::debug!(
			prompt_chars = prompt.chars().count(),
			history_messages = history.len(),
			"Prompt assembled."
		);

		let answer = self
			.providers
			.llm
			.generate(&self.cfg.aws, &self.cfg.llm, &prompt)
			.await
			.map_err(|err| {
				tracing::error!(error = %err, "Answer generation failed.");

				Error::Generation { message: err.to_string() }
			})?;

		tracing::info!(answer_chars = answer.chars().count(), "Answer generated.");

		Ok(answer)
	}

	pub async fn query(&self, request: ChatRequest) -> Result<QueryResponse> {
		let (query, history) = split_request(&request)?;
		let response = self.answer(query, history).await?;

		Ok(QueryResponse { response })
	}

	/// Computes the whole answer first, so upstream failures surface before any chunk is sent.
	pub async fn stream(&self, request: ChatRequest) -> Result<AnswerStream> {
		let (query, history) = split_request(&request)?;
		let answer = self.answer(query, history).await?;

		Ok(answer_stream(&answer, Duration::from_millis(self.cfg.stream.word_delay_ms)))
	}
}
