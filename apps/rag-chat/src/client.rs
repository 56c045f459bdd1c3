use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::{Error, Result};
use rag_service::{ChatRequest, Message};

const NO_RESPONSE: &str = "No response received";

/// HTTP client for the `/rag/*` backend routes.
#[derive(Debug, Clone)]
pub struct BackendClient {
	base_url: String,
	http: Client,
}
impl BackendClient {
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
		let http = Client::builder().timeout(timeout).build()?;

		Ok(Self { base_url: normalize_base_url(base_url), http })
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn set_base_url(&mut self, base_url: &str) {
		self.base_url = normalize_base_url(base_url);
	}

	pub async fn query(&self, messages: &[Message]) -> Result<String> {
		let res = self
			.http
			.post(format!("{}/rag/query", self.base_url))
			.json(&ChatRequest { messages: messages.to_vec() })
			.send()
			.await?;
		let status = res.status();

		if !status.is_success() {
			return Err(backend_error(res).await);
		}

		let json: Value = res.json().await.map_err(|err| Error::InvalidResponse {
			message: format!("Backend returned a non-JSON body: {err}"),
		})?;

		parse_query_response(status, &json)
	}

	/// Feeds each decoded chunk to `on_chunk` as it arrives and returns the full text.
	pub async fn stream<F>(&self, messages: &[Message], mut on_chunk: F) -> Result<String>
	where
		F: FnMut(&str),
	{
		let res = self
			.http
			.post(format!("{}/rag/stream", self.base_url))
			.json(&ChatRequest { messages: messages.to_vec() })
			.send()
			.await?;

		if !res.status().is_success() {
			return Err(backend_error(res).await);
		}

		let mut body = res.bytes_stream();
		let mut decoder = Utf8Decoder::default();
		let mut full = String::new();

		while let Some(bytes) = body.next().await {
			let text = decoder.push(&bytes?);

			if !text.is_empty() {
				on_chunk(&text);
				full.push_str(&text);
			}
		}

		let tail = decoder.finish();

		if !tail.is_empty() {
			on_chunk(&tail);
			full.push_str(&tail);
		}

		Ok(full)
	}

	pub async fn ping(&self) -> Result<StatusCode> {
		let res = self
			.http
			.get(format!("{}/health", self.base_url))
			.timeout(Duration::from_secs(5))
			.send()
			.await?;

		Ok(res.status())
	}
}

fn normalize_base_url(base_url: &str) -> String {
	base_url.trim().trim_end_matches('/').to_string()
}

fn parse_query_response(status: StatusCode, json: &Value) -> Result<String> {
	if let Some(error) = json.get("error") {
		let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());

		return Err(Error::Backend { status: status.as_u16(), message });
	}
	if !status.is_success() {
		return Err(Error::Backend { status: status.as_u16(), message: json.to_string() });
	}

	Ok(json.get("response").and_then(Value::as_str).unwrap_or(NO_RESPONSE).to_string())
}

async fn backend_error(res: Response) -> Error {
	let status = res.status();
	let text = match res.text().await {
		Ok(text) => text,
		Err(err) => {
			tracing::debug!(error = %err, "Failed to read backend error body.");

			String::new()
		},
	};
	let message = serde_json::from_str::<Value>(&text)
		.ok()
		.and_then(|json| json.get("error").and_then(Value::as_str).map(str::to_string))
		.unwrap_or_else(|| text.trim().to_string());
	let message = if message.is_empty() {
		status.canonical_reason().unwrap_or("Unknown error").to_string()
	} else {
		message
	};

	Error::Backend { status: status.as_u16(), message }
}

/// Decodes UTF-8 across chunk boundaries, holding back incomplete trailing sequences.
#[derive(Debug, Default)]
struct Utf8Decoder {
	pending: Vec<u8>,
}
impl Utf8Decoder {
	fn push(&mut self, bytes: &[u8]) -> String {
		self.pending.extend_from_slice(bytes);

		let mut text = String::new();
		let mut start = 0;

		while start < self.pending.len() {
			match std::str::from_utf8(&self.pending[start..]) {
				Ok(valid) => {
					text.push_str(valid);
					start = self.pending.len();
				},
				Err(err) => {
					let valid_end = start + err.valid_up_to();

					text.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));

					match err.error_len() {
						Some(len) => {
							text.push(char::REPLACEMENT_CHARACTER);
							start = valid_end + len;
						},
						// Incomplete trailing sequence; wait for the next chunk.
						None => {
							start = valid_end;

							break;
						},
					}
				},
			}
		}

		self.pending.drain(..start);

		text
	}

	fn finish(&mut self) -> String {
		let text = String::from_utf8_lossy(&self.pending).into_owned();

		self.pending.clear();

		text
	}
}
