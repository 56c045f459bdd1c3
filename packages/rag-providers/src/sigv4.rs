//! AWS Signature Version 4 for JSON POSTs against Bedrock endpoints.

use std::fmt;

use hmac::{Hmac, Mac};
use reqwest::{
	Url,
	header::{HeaderMap, HeaderName, HeaderValue},
};
use sha2::{Digest, Sha256};
use time::{OffsetDateTime, UtcOffset, macros::format_description};

use crate::{Error, Result};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Both `bedrock-runtime` and `bedrock-agent-runtime` sign under this service name.
pub const BEDROCK_SERVICE: &str = "bedrock";

#[derive(Clone)]
pub struct Credentials {
	pub access_key_id: String,
	pub secret_access_key: String,
	pub session_token: Option<String>,
}
impl Credentials {
	pub fn from_config(aws: &rag_config::Aws) -> Result<Self> {
		let access_key_id = aws.access_key_id.clone().ok_or_else(|| Error::InvalidConfig {
			message: "aws.access_key_id is not configured.".to_string(),
		})?;
		let secret_access_key =
			aws.secret_access_key.clone().ok_or_else(|| Error::InvalidConfig {
				message: "aws.secret_access_key is not configured.".to_string(),
			})?;

		Ok(Self { access_key_id, secret_access_key, session_token: aws.session_token.clone() })
	}
}
impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("access_key_id", &self.access_key_id)
			.field("secret_access_key", &"<redacted>")
			.field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

pub struct SigningRequest<'a> {
	pub method: &'a str,
	pub url: &'a Url,
	pub content_type: &'a str,
	pub body: &'a [u8],
	pub region: &'a str,
	pub service: &'a str,
}

/// Returns the `authorization`, `x-amz-*` headers to attach to the request.
///
/// `host` and `content-type` are covered by the signature, so the caller must send exactly the
/// content type passed in and let the client derive `host` from the same URL.
pub fn sign(
	request: &SigningRequest<'_>,
	credentials: &Credentials,
	now: OffsetDateTime,
) -> Result<HeaderMap> {
	let now = now.to_offset(UtcOffset::UTC);
	let amz_date = now.format(&format_description!("[year][month][day]T[hour][minute][second]Z"))?;
	let date = now.format(&format_description!("[year][month][day]"))?;
	let payload_hash = hex(&Sha256::digest(request.body));
	let host = host_header(request.url)?;
	let mut signed = vec![
		("content-type".to_string(), request.content_type.trim().to_string()),
		("host".to_string(), host),
		("x-amz-content-sha256".to_string(), payload_hash.clone()),
		("x-amz-date".to_string(), amz_date.clone()),
	];

	if let Some(token) = credentials.session_token.as_deref() {
		signed.push(("x-amz-security-token".to_string(), token.trim().to_string()));
	}

	signed.sort_by(|a, b| a.0.cmp(&b.0));

	let (canonical, signed_headers) = canonical_request(
		request.method,
		&canonical_uri(request.url),
		&canonical_query(request.url),
		&signed,
		&payload_hash,
	);
	let scope = format!("{date}/{}/{}/aws4_request", request.region, request.service);
	let to_sign = string_to_sign(&amz_date, &scope, &canonical);
	let key = signing_key(&credentials.secret_access_key, &date, request.region, request.service);
	let signature = hex(&hmac_sha256(&key, to_sign.as_bytes()));
	let authorization = format!(
		"{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
		credentials.access_key_id
	);
	let mut headers = HeaderMap::new();

	headers.insert(HeaderName::from_static("authorization"), authorization.parse()?);
	headers.insert(HeaderName::from_static("x-amz-date"), HeaderValue::from_str(&amz_date)?);
	headers.insert(
		HeaderName::from_static("x-amz-content-sha256"),
		HeaderValue::from_str(&payload_hash)?,
	);

	if let Some(token) = credentials.session_token.as_deref() {
		headers.insert(HeaderName::from_static("x-amz-security-token"), token.trim().parse()?);
	}

	Ok(headers)
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
	let mut out = String::with_capacity(input.len());

	for byte in input.bytes() {
		match byte {
			b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
				out.push(byte as char)
			},
			b'/' if !encode_slash => out.push('/'),
			_ => out.push_str(&format!("%{byte:02X}")),
		}
	}

	out
}

fn host_header(url: &Url) -> Result<String> {
	let host = url.host_str().ok_or_else(|| Error::InvalidConfig {
		message: format!("Endpoint URL {url} has no host."),
	})?;

	Ok(match url.port() {
		Some(port) => format!("{host}:{port}"),
		None => host.to_string(),
	})
}

// Non-S3 services encode the already-encoded path a second time.
fn canonical_uri(url: &Url) -> String {
	let path = url.path();

	if path.is_empty() { "/".to_string() } else { uri_encode(path, false) }
}

fn canonical_query(url: &Url) -> String {
	let mut pairs: Vec<(String, String)> = url
		.query_pairs()
		.map(|(key, value)| (uri_encode(&key, true), uri_encode(&value, true)))
		.collect();

	pairs.sort();

	pairs.into_iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&")
}

fn canonical_request(
	method: &str,
	canonical_uri: &str,
	canonical_query: &str,
	sorted_headers: &[(String, String)],
	payload_hash: &str,
) -> (String, String) {
	let canonical_headers: String =
		sorted_headers.iter().map(|(name, value)| format!("{name}:{value}\n")).collect();
	let signed_headers =
		sorted_headers.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>().join(";");
	let canonical = [
		method,
		canonical_uri,
		canonical_query,
		canonical_headers.as_str(),
		signed_headers.as_str(),
		payload_hash,
	]
	.join("\n");

	(canonical, signed_headers)
}

fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
	format!("{ALGORITHM}\n{amz_date}\n{scope}\n{}", hex(&Sha256::digest(canonical_request)))
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
	let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
	let k_region = hmac_sha256(&k_date, region.as_bytes());
	let k_service = hmac_sha256(&k_region, service.as_bytes());

	hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
	let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");

	mac.update(message);

	mac.finalize().into_bytes().to_vec()
}

fn hex(bytes: &[u8]) -> String {
	bytes.iter().map(|b| format!("{b:02x}")).collect()
}
