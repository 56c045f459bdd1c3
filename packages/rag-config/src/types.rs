use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub aws: Aws,
	#[serde(default)]
	pub knowledge_base: KnowledgeBase,
	#[serde(default)]
	pub llm: Llm,
	#[serde(default)]
	pub stream: Stream,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	#[serde(default)]
	pub bind_localhost_only: bool,
}

/// Region and static credentials used to sign every upstream request.
///
/// Any field left out of the file is filled from the matching `AWS_*` environment variable at
/// load time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Aws {
	#[serde(default)]
	pub region: String,
	pub access_key_id: Option<String>,
	pub secret_access_key: Option<String>,
	pub session_token: Option<String>,
}
impl Aws {
	/// Regional endpoint for a Bedrock service prefix such as `bedrock-runtime`.
	pub fn endpoint_for(&self, service_prefix: &str) -> String {
		format!("https://{service_prefix}.{}.amazonaws.com", self.region)
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeBase {
	pub knowledge_base_id: String,
	pub top_k: u32,
	/// Optional. Overrides the regional `bedrock-agent-runtime` endpoint.
	pub endpoint: Option<String>,
	pub timeout_ms: u64,
}
impl KnowledgeBase {
	pub fn resolved_endpoint(&self, aws: &Aws) -> String {
		match self.endpoint.as_deref() {
			Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
			None => aws.endpoint_for("bedrock-agent-runtime"),
		}
	}
}
impl Default for KnowledgeBase {
	fn default() -> Self {
		Self { knowledge_base_id: String::new(), top_k: 3, endpoint: None, timeout_ms: 30_000 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Llm {
	pub model_id: String,
	pub anthropic_version: String,
	pub max_tokens: u32,
	pub temperature: f32,
	pub system_prompt: String,
	/// Optional. Overrides the regional `bedrock-runtime` endpoint.
	pub endpoint: Option<String>,
	pub timeout_ms: u64,
}
impl Llm {
	pub fn resolved_endpoint(&self, aws: &Aws) -> String {
		match self.endpoint.as_deref() {
			Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
			None => aws.endpoint_for("bedrock-runtime"),
		}
	}
}
impl Default for Llm {
	fn default() -> Self {
		Self {
			model_id: String::new(),
			anthropic_version: "bedrock-2023-05-31".to_string(),
			max_tokens: 1_024,
			temperature: 0.5,
			system_prompt: "You are a helpful assistant.".to_string(),
			endpoint: None,
			timeout_ms: 60_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Stream {
	pub word_delay_ms: u64,
}
impl Default for Stream {
	fn default() -> Self {
		Self { word_delay_ms: 50 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
