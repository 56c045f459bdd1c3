use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use rag_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_with<F>(edit: F) -> String
where
	F: FnOnce(&mut toml::Table),
{
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let root = value.as_table_mut().expect("Sample config must be a table.");

	edit(root);

	toml::to_string(&value).expect("Failed to render sample config.")
}

fn section<'a>(root: &'a mut toml::Table, name: &str) -> &'a mut toml::Table {
	root.get_mut(name)
		.and_then(Value::as_table_mut)
		.unwrap_or_else(|| panic!("Sample config must include [{name}]."))
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("rag_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> rag_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = rag_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

#[test]
fn sample_config_loads() {
	let cfg = load_payload(SAMPLE_CONFIG_TOML.to_string()).expect("Sample config must load.");

	assert_eq!(cfg.knowledge_base.top_k, 3);
	assert_eq!(cfg.llm.anthropic_version, "bedrock-2023-05-31");
	assert_eq!(cfg.stream.word_delay_ms, 50);
	assert!(cfg.service.bind_localhost_only);
}

#[test]
fn defaults_fill_optional_sections() {
	let cfg: Config = toml::from_str(
		r#"
[service]
http_bind = "0.0.0.0:8000"
"#,
	)
	.expect("Failed to parse config.");

	assert_eq!(cfg.service.log_level, "info");
	assert!(!cfg.service.bind_localhost_only);
	assert_eq!(cfg.knowledge_base.top_k, 3);
	assert_eq!(cfg.llm.max_tokens, 1_024);
	assert_eq!(cfg.llm.temperature, 0.5);
	assert_eq!(cfg.llm.system_prompt, "You are a helpful assistant.");
	assert_eq!(cfg.stream.word_delay_ms, 50);
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("rag_config_test_missing_file.toml");
	let err = rag_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err:?}");
}

#[test]
fn malformed_toml_reports_parse_error() {
	let err = load_payload("[service\nhttp_bind = ".to_string()).expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err:?}");
}

#[test]
fn top_k_must_be_positive() {
	let payload = sample_with(|root| {
		section(root, "knowledge_base").insert("top_k".to_string(), Value::Integer(0));
	});
	let err = load_payload(payload).expect_err("Expected top_k validation error.");

	assert!(
		err.to_string().contains("knowledge_base.top_k must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn temperature_must_be_in_range() {
	let payload = sample_with(|root| {
		section(root, "llm").insert("temperature".to_string(), Value::Float(1.5));
	});
	let err = load_payload(payload).expect_err("Expected temperature validation error.");

	assert!(
		err.to_string().contains("llm.temperature must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn endpoint_override_must_be_http() {
	let payload = sample_with(|root| {
		section(root, "llm")
			.insert("endpoint".to_string(), Value::String("localhost:4566".to_string()));
	});
	let err = load_payload(payload).expect_err("Expected endpoint validation error.");

	assert!(
		err.to_string().contains("llm.endpoint must start with http:// or https://."),
		"Unexpected error: {err}"
	);
}

#[test]
fn blank_endpoint_falls_back_to_regional_default() {
	let payload = sample_with(|root| {
		section(root, "knowledge_base").insert("endpoint".to_string(), Value::String("  ".into()));
	});
	let cfg = load_payload(payload).expect("Blank endpoint must be accepted.");

	assert_eq!(
		cfg.knowledge_base.resolved_endpoint(&cfg.aws),
		"https://bedrock-agent-runtime.us-east-1.amazonaws.com"
	);
	assert_eq!(cfg.llm.resolved_endpoint(&cfg.aws), "https://bedrock-runtime.us-east-1.amazonaws.com");
}

#[test]
fn endpoint_override_drops_trailing_slash() {
	let mut cfg = base_config();

	cfg.llm.endpoint = Some("http://127.0.0.1:4566/".to_string());

	assert_eq!(cfg.llm.resolved_endpoint(&cfg.aws), "http://127.0.0.1:4566");
}

#[test]
fn model_id_must_be_present() {
	let mut cfg = base_config();

	cfg.llm.model_id = String::new();

	let err = rag_config::validate(&cfg).expect_err("Expected model_id validation error.");

	assert!(err.to_string().contains("llm.model_id must be non-empty"), "Unexpected error: {err}");
}

#[test]
fn secret_key_must_be_present() {
	let mut cfg = base_config();

	cfg.aws.secret_access_key = None;

	let err = rag_config::validate(&cfg).expect_err("Expected credential validation error.");

	assert!(
		err.to_string().contains("aws.secret_access_key must be non-empty"),
		"Unexpected error: {err}"
	);
}

#[test]
fn max_tokens_must_be_positive() {
	let payload = sample_with(|root| {
		section(root, "llm").insert("max_tokens".to_string(), Value::Integer(0));
	});
	let err = load_payload(payload).expect_err("Expected max_tokens validation error.");

	assert!(
		err.to_string().contains("llm.max_tokens must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn knowledge_base_timeout_must_be_positive() {
	let payload = sample_with(|root| {
		section(root, "knowledge_base").insert("timeout_ms".to_string(), Value::Integer(0));
	});
	let err = load_payload(payload).expect_err("Expected timeout validation error.");

	assert!(
		err.to_string().contains("knowledge_base.timeout_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn llm_timeout_must_be_positive() {
	let payload = sample_with(|root| {
		section(root, "llm").insert("timeout_ms".to_string(), Value::Integer(0));
	});
	let err = load_payload(payload).expect_err("Expected timeout validation error.");

	assert!(
		err.to_string().contains("llm.timeout_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn temperature_must_be_finite() {
	for temperature in [f32::NAN, f32::INFINITY] {
		let mut cfg = base_config();

		cfg.llm.temperature = temperature;

		let err = rag_config::validate(&cfg).expect_err("Expected temperature validation error.");

		assert!(
			err.to_string().contains("llm.temperature must be a finite number."),
			"Unexpected error for {temperature}: {err}"
		);
	}
}

#[test]
fn http_bind_must_be_present() {
	let payload = sample_with(|root| {
		section(root, "service").insert("http_bind".to_string(), Value::String("  ".into()));
	});
	let err = load_payload(payload).expect_err("Expected http_bind validation error.");

	assert!(
		err.to_string().contains("service.http_bind must be non-empty."),
		"Unexpected error: {err}"
	);
}

// Validated directly: `load` would fill these from AWS_REGION and KNOWLEDGE_BASE_ID.
#[test]
fn region_must_be_present() {
	let mut cfg = base_config();

	cfg.aws.region = String::new();

	let err = rag_config::validate(&cfg).expect_err("Expected region validation error.");

	assert!(err.to_string().contains("aws.region must be non-empty"), "Unexpected error: {err}");
}

#[test]
fn knowledge_base_id_must_be_present() {
	let mut cfg = base_config();

	cfg.knowledge_base.knowledge_base_id = String::new();

	let err = rag_config::validate(&cfg).expect_err("Expected knowledge base id validation error.");

	assert!(
		err.to_string().contains("knowledge_base.knowledge_base_id must be non-empty"),
		"Unexpected error: {err}"
	);
}

#[test]
fn anthropic_version_must_be_present() {
	let payload = sample_with(|root| {
		section(root, "llm").insert("anthropic_version".to_string(), Value::String(" ".into()));
	});
	let err = load_payload(payload).expect_err("Expected anthropic_version validation error.");

	assert!(
		err.to_string().contains("llm.anthropic_version must be non-empty."),
		"Unexpected error: {err}"
	);
}
