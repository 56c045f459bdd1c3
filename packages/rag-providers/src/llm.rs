use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use rag_config::{Aws, Llm};

use crate::{Credentials, Result, sigv4::uri_encode};

/// Returned when the model answers without any content blocks.
pub const NO_RESPONSE: &str = "No response from model.";

/// Sends a single-turn Anthropic Messages request through Bedrock `InvokeModel`.
pub async fn generate(aws: &Aws, cfg: &Llm, prompt: &str) -> Result<String> {
	let credentials = Credentials::from_config(aws)?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = invoke_url(&cfg.resolved_endpoint(aws), &cfg.model_id)?;
	let body = invoke_body(cfg, prompt);
	let json = crate::post_signed(&client, &credentials, &aws.region, url, &body).await?;

	let usage = InvocationUsage::from_response(&json);

	tracing::debug!(
		model_id = %cfg.model_id,
		stop_reason = usage.stop_reason,
		input_tokens = usage.input_tokens,
		output_tokens = usage.output_tokens,
		"Model invocation completed."
	);

	Ok(parse_invoke_response(&json))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InvocationUsage<'a> {
	stop_reason: &'a str,
	input_tokens: u64,
	output_tokens: u64,
}
impl<'a> InvocationUsage<'a> {
	fn from_response(json: &'a Value) -> Self {
		Self {
			stop_reason: json.get("stop_reason").and_then(Value::as_str).unwrap_or("unknown"),
			input_tokens: json.pointer("/usage/input_tokens").and_then(Value::as_u64).unwrap_or(0),
			output_tokens: json.pointer("/usage/output_tokens").and_then(Value::as_u64).unwrap_or(0),
		}
	}
}

pub fn invoke_url(endpoint: &str, model_id: &str) -> Result<Url> {
	crate::endpoint_url(endpoint, &format!("/model/{}/invoke", uri_encode(model_id, true)))
}

pub fn invoke_body(cfg: &Llm, prompt: &str) -> Value {
	serde_json::json!({
		"anthropic_version": cfg.anthropic_version,
		"max_tokens": cfg.max_tokens,
		"temperature": cfg.temperature,
		"messages": [{ "role": "user", "content": prompt }],
		"system": cfg.system_prompt,
	})
}

fn parse_invoke_response(json: &Value) -> String {
	match json.get("content").and_then(Value::as_array).and_then(|blocks| blocks.first()) {
		Some(block) => block.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
		None => NO_RESPONSE.to_string(),
	}
}
