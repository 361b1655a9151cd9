mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Catalog, Chat, Config, LlmProviderConfig, Postgres, Providers, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("providers.llm_extractor.api_base", &cfg.providers.llm_extractor.api_base),
		("providers.llm_extractor.model", &cfg.providers.llm_extractor.model),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.catalog.query_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "catalog.query_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.llm_extractor.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.llm_extractor.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.llm_extractor.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider llm_extractor api_key must be non-empty.".to_string(),
		});
	}

	let temperature = cfg.providers.llm_extractor.temperature;

	if !temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.llm_extractor.temperature must be a finite number.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&temperature) {
		return Err(Error::Validation {
			message: "providers.llm_extractor.temperature must be in the range 0.0-2.0."
				.to_string(),
		});
	}

	for (key, value) in &cfg.providers.llm_extractor.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!(
					"providers.llm_extractor.default_headers.{key} must be a string."
				),
			});
		}
	}

	if cfg.chat.history_max_turns == 0 {
		return Err(Error::Validation {
			message: "chat.history_max_turns must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.chat.household_rooms_hint.as_deref().map(|hint| hint.trim().is_empty()).unwrap_or(false)
	{
		cfg.chat.household_rooms_hint = None;
	}

	let api_base = cfg.providers.llm_extractor.api_base.trim_end_matches('/').to_string();

	cfg.providers.llm_extractor.api_base = api_base;
}
