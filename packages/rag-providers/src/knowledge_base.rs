use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use rag_config::{Aws, KnowledgeBase};

use crate::{Credentials, Error, Result, sigv4::uri_encode};

/// One retrieval hit.
///
/// `position` is the 1-based rank in the upstream result list. Hits without text are dropped
/// without renumbering the rest, so positions can skip.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
	pub position: usize,
	pub text: String,
	pub score: Option<f64>,
	pub source_uri: Option<String>,
}

pub async fn retrieve(aws: &Aws, cfg: &KnowledgeBase, query: &str) -> Result<Vec<Passage>> {
	let credentials = Credentials::from_config(aws)?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = retrieve_url(&cfg.resolved_endpoint(aws), &cfg.knowledge_base_id)?;
	let body = retrieve_body(query, cfg.top_k);
	let json = crate::post_signed(&client, &credentials, &aws.region, url, &body).await?;

	parse_retrieve_response(json)
}

pub fn retrieve_url(endpoint: &str, knowledge_base_id: &str) -> Result<Url> {
	crate::endpoint_url(
		endpoint,
		&format!("/knowledgebases/{}/retrieve", uri_encode(knowledge_base_id, true)),
	)
}

pub fn retrieve_body(query: &str, top_k: u32) -> Value {
	serde_json::json!({
		"retrievalQuery": { "text": query },
		"retrievalConfiguration": {
			"vectorSearchConfiguration": { "numberOfResults": top_k }
		},
	})
}

fn parse_retrieve_response(json: Value) -> Result<Vec<Passage>> {
	if !json.is_object() {
		return Err(Error::InvalidResponse {
			message: "Retrieve response must be a JSON object.".to_string(),
		});
	}

	let Some(results) = json.get("retrievalResults").and_then(Value::as_array) else {
		return Ok(Vec::new());
	};
	let mut passages = Vec::with_capacity(results.len());

	for (index, item) in results.iter().enumerate() {
		let Some(text) = item.get("content").and_then(|c| c.get("text")).and_then(Value::as_str)
		else {
			continue;
		};
		let location = item.get("location");
		let source_uri = location
			.and_then(|l| l.get("s3Location"))
			.and_then(|s3| s3.get("uri"))
			.or_else(|| location.and_then(|l| l.get("webLocation")).and_then(|w| w.get("url")))
			.and_then(Value::as_str)
			.map(str::to_string);

		passages.push(Passage {
			position: index + 1,
			text: text.to_string(),
			score: item.get("score").and_then(Value::as_f64),
			source_uri,
		});
	}

	Ok(passages)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keeps_upstream_positions_when_skipping() {
		let json = serde_json::json!({
			"retrievalResults": [
				{ "content": { "text": "alpha" }, "score": 0.9 },
				{ "content": { "type": "IMAGE" } },
				{
					"content": { "text": "gamma" },
					"location": { "s3Location": { "uri": "s3://bucket/gamma.md" } }
				}
			]
		});
		let passages = parse_retrieve_response(json).expect("parse failed");

		assert_eq!(passages.len(), 2);
		assert_eq!(passages[0].position, 1);
		assert_eq!(passages[0].score, Some(0.9));
		assert_eq!(passages[1].position, 3);
		assert_eq!(passages[1].source_uri.as_deref(), Some("s3://bucket/gamma.md"));
	}

	#[test]
	fn missing_results_is_empty() {
		let passages = parse_retrieve_response(serde_json::json!({})).expect("parse failed");

		assert!(passages.is_empty());
	}

	#[test]
	fn rejects_non_object_body() {
		assert!(parse_retrieve_response(serde_json::json!([1, 2])).is_err());
	}

	#[test]
	fn reads_web_location_url() {
		let json = serde_json::json!({
			"retrievalResults": [{
				"content": { "text": "page" },
				"location": { "webLocation": { "url": "https://example.com/doc" } }
			}]
		});
		let passages = parse_retrieve_response(json).expect("parse failed");

		assert_eq!(passages[0].source_uri.as_deref(), Some("https://example.com/doc"));
	}

	#[test]
	fn request_shape() {
		let body = retrieve_body("what is rust", 3);

		assert_eq!(body["retrievalQuery"]["text"], "what is rust");
		assert_eq!(body["retrievalConfiguration"]["vectorSearchConfiguration"]["numberOfResults"], 3);

		let url = retrieve_url("https://bedrock-agent-runtime.us-east-1.amazonaws.com", "KB 1")
			.expect("Failed to build URL.");

		assert_eq!(url.path(), "/knowledgebases/KB%201/retrieve");
	}
}
