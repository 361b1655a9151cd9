use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub catalog: Catalog,
	pub providers: Providers,
	#[serde(default)]
	pub chat: Chat,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Catalog {
	/// Upper bound for one catalog query, end to end.
	pub query_timeout_ms: u64,
	/// Only list properties that carry at least one image record.
	pub require_images: bool,
}
impl Default for Catalog {
	fn default() -> Self {
		Self { query_timeout_ms: 5_000, require_images: true }
	}
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub llm_extractor: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	/// Bound for one HTTP request; a retried extraction may take up to three of these.
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Chat {
	/// Number of most recent turns rendered into the extractor prompt.
	pub history_max_turns: u32,
	/// Prompt guidance mapping household sizes to a minimum room count.
	///
	/// Owned by the prompt, never interpreted by the query compiler.
	pub household_rooms_hint: Option<String>,
}
impl Default for Chat {
	fn default() -> Self {
		Self { history_max_turns: 20, household_rooms_hint: None }
	}
}
