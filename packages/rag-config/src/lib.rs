mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Aws, Config, KnowledgeBase, Llm, Service, Stream};

use std::{env, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	apply_env_fallbacks(&mut cfg, |key| env::var(key).ok());

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.aws.region.trim().is_empty() {
		return Err(Error::Validation {
			message: "aws.region must be non-empty (or set AWS_REGION).".to_string(),
		});
	}

	for (label, env_key, value) in [
		("aws.access_key_id", "AWS_ACCESS_KEY_ID", &cfg.aws.access_key_id),
		("aws.secret_access_key", "AWS_SECRET_ACCESS_KEY", &cfg.aws.secret_access_key),
	] {
		if value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true) {
			return Err(Error::Validation {
				message: format!("{label} must be non-empty (or set {env_key})."),
			});
		}
	}

	if cfg.knowledge_base.knowledge_base_id.trim().is_empty() {
		return Err(Error::Validation {
			message: "knowledge_base.knowledge_base_id must be non-empty (or set KNOWLEDGE_BASE_ID)."
				.to_string(),
		});
	}
	if cfg.knowledge_base.top_k == 0 {
		return Err(Error::Validation {
			message: "knowledge_base.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.knowledge_base.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "knowledge_base.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.llm.model_id.trim().is_empty() {
		return Err(Error::Validation {
			message: "llm.model_id must be non-empty (or set MODEL_ID).".to_string(),
		});
	}
	if cfg.llm.anthropic_version.trim().is_empty() {
		return Err(Error::Validation {
			message: "llm.anthropic_version must be non-empty.".to_string(),
		});
	}
	if cfg.llm.max_tokens == 0 {
		return Err(Error::Validation {
			message: "llm.max_tokens must be greater than zero.".to_string(),
		});
	}
	if !cfg.llm.temperature.is_finite() {
		return Err(Error::Validation {
			message: "llm.temperature must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.llm.temperature) {
		return Err(Error::Validation {
			message: "llm.temperature must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.llm.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "llm.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, endpoint) in [
		("knowledge_base.endpoint", &cfg.knowledge_base.endpoint),
		("llm.endpoint", &cfg.llm.endpoint),
	] {
		if let Some(endpoint) = endpoint.as_deref()
			&& !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
		{
			return Err(Error::Validation {
				message: format!("{label} must start with http:// or https://."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for value in [
		&mut cfg.aws.access_key_id,
		&mut cfg.aws.secret_access_key,
		&mut cfg.aws.session_token,
		&mut cfg.knowledge_base.endpoint,
		&mut cfg.llm.endpoint,
	] {
		if value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(false) {
			*value = None;
		}
	}

	cfg.aws.region = cfg.aws.region.trim().to_string();
	cfg.knowledge_base.knowledge_base_id = cfg.knowledge_base.knowledge_base_id.trim().to_string();
	cfg.llm.model_id = cfg.llm.model_id.trim().to_string();
}

/// Fills fields the file leaves blank from the environment. Values present in the file win.
fn apply_env_fallbacks<F>(cfg: &mut Config, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

	if cfg.aws.region.is_empty()
		&& let Some(region) = non_blank("AWS_REGION")
	{
		cfg.aws.region = region;
	}
	// Credentials are one set. Keys from the file never pick up an environment session token.
	if cfg.aws.access_key_id.is_none() && cfg.aws.secret_access_key.is_none() {
		cfg.aws.access_key_id = non_blank("AWS_ACCESS_KEY_ID");
		cfg.aws.secret_access_key = non_blank("AWS_SECRET_ACCESS_KEY");

		if cfg.aws.session_token.is_none() {
			cfg.aws.session_token = non_blank("AWS_SESSION_TOKEN");
		}
	}
	if cfg.knowledge_base.knowledge_base_id.is_empty()
		&& let Some(id) = non_blank("KNOWLEDGE_BASE_ID")
	{
		cfg.knowledge_base.knowledge_base_id = id;
	}
	if cfg.llm.model_id.is_empty()
		&& let Some(id) = non_blank("MODEL_ID")
	{
		cfg.llm.model_id = id;
	}
}
