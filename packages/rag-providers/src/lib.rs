pub mod knowledge_base;
pub mod llm;
pub mod sigv4;

mod error;

pub use error::{Error, Result};
pub use knowledge_base::Passage;
pub use sigv4::Credentials;

use reqwest::{
	Client, StatusCode, Url,
	header::{ACCEPT, CONTENT_TYPE},
};
use serde_json::Value;
use time::OffsetDateTime;

use crate::sigv4::{BEDROCK_SERVICE, SigningRequest};

const JSON: &str = "application/json";

/// Joins an endpoint base and an already-encoded path.
pub fn endpoint_url(endpoint: &str, path: &str) -> Result<Url> {
	let raw = format!("{}{}", endpoint.trim_end_matches('/'), path);

	Url::parse(&raw).map_err(|err| Error::InvalidConfig {
		message: format!("Endpoint URL {raw} is invalid: {err}"),
	})
}

pub(crate) async fn post_signed(
	client: &Client,
	credentials: &Credentials,
	region: &str,
	url: Url,
	body: &Value,
) -> Result<Value> {
	let payload = serde_json::to_vec(body)?;
	let signing = SigningRequest {
		method: "POST",
		url: &url,
		content_type: JSON,
		body: &payload,
		region,
		service: BEDROCK_SERVICE,
	};
	let headers = sigv4::sign(&signing, credentials, OffsetDateTime::now_utc())?;
	let res = client
		.post(url.clone())
		.header(CONTENT_TYPE, JSON)
		.header(ACCEPT, JSON)
		.headers(headers)
		.body(payload)
		.send()
		.await?;
	let status = res.status();

	if !status.is_success() {
		let text = match res.text().await {
			Ok(text) => text,
			Err(err) => {
				tracing::debug!(%url, error = %err, "Failed to read upstream error body.");

				String::new()
			},
		};

		tracing::warn!(%url, status = status.as_u16(), "Upstream request failed.");

		return Err(Error::Api { status: status.as_u16(), message: error_message(status, &text) });
	}

	Ok(res.json().await?)
}

/// Bedrock error bodies carry `message` or `Message`; anything else is passed through as text.
fn error_message(status: StatusCode, text: &str) -> String {
	if let Ok(json) = serde_json::from_str::<Value>(text)
		&& let Some(message) =
			json.get("message").or_else(|| json.get("Message")).and_then(Value::as_str)
	{
		return message.to_string();
	}

	let trimmed = text.trim();

	if trimmed.is_empty() {
		status.canonical_reason().unwrap_or("Unknown error").to_string()
	} else {
		trimmed.to_string()
	}
}
