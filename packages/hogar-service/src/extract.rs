//! Extractor prompt assembly and strict decoding of its answer.

use std::time::Duration;

use serde_json::Value;

use hogar_config::LlmProviderConfig;
use hogar_domain::filter::PartialFilter;
use hogar_providers::extractor;

use crate::ExtractorProvider;

const SYSTEM_PROMPT: &str = r#"You turn one message of a property-search conversation into a JSON object with search criteria.
Output only a JSON object. Omit every field the message does not mention; never invent values.

Fields:
- operationType: "SALE" or "RENT".
- propertyType: string, e.g. "casa", "departamento".
- locality: string, the town or neighbourhood.
- bedroomsExact, bathroomsExact: integers.
- roomsMin, areaMin: integers (areaMin in square metres).
- priceMax: number.
- architecturalStyle: string.
- viewTypes: array of strings.
- desiredTags: array of phrases "<space> <descriptor> [descriptor ...]", e.g. "cocina grande y luminosa".
- excludedTags: array of phrases in the same format for features the user does not want.
- freeTextQuery: comma-separated words to look for in descriptions, e.g. "pileta, quincho".
  A bare feature without a descriptor ("pileta") goes here, never into desiredTags.
- resetSearch: true only when the user starts a new search from scratch.
- requestedListing: 1-based position of a listing from the previous results the user asks about.

Lists replace earlier lists: repeat every item the user still wants."#;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionFailure {
	#[error("Extractor call failed: {message}")]
	Transport { message: String },
	#[error("Extractor call timed out after {timeout_ms} ms.")]
	Timeout { timeout_ms: u64 },
	#[error("Extractor output does not match the filter schema: {message}")]
	Schema { message: String },
}

pub fn build_messages(
	utterance: &str,
	history_text: &str,
	household_rooms_hint: Option<&str>,
) -> Vec<Value> {
	let mut system = SYSTEM_PROMPT.to_string();

	if let Some(hint) = household_rooms_hint {
		system.push_str("\n\nHousehold size guidance: ");
		system.push_str(hint);
	}

	let mut messages = vec![serde_json::json!({ "role": "system", "content": system })];

	if !history_text.trim().is_empty() {
		messages.push(serde_json::json!({
			"role": "system",
			"content": format!("Conversation so far:\n{history_text}"),
		}));
	}

	messages.push(serde_json::json!({ "role": "user", "content": utterance }));

	messages
}

/// Decodes the extractor's JSON object. Unknown fields are ignored; a mistyped field or an
/// unknown operation value rejects the whole object.
pub fn decode(value: Value) -> Result<PartialFilter, ExtractionFailure> {
	if value.is_null() {
		return Ok(PartialFilter::default());
	}

	serde_json::from_value::<PartialFilter>(value)
		.map(PartialFilter::normalized)
		.map_err(|err| ExtractionFailure::Schema { message: err.to_string() })
}

/// Whole-call bound: every retry attempt gets the full per-request timeout.
pub fn call_budget(cfg: &LlmProviderConfig) -> Duration {
	let attempts = u32::try_from(extractor::MAX_ATTEMPTS).unwrap_or(u32::MAX);

	Duration::from_millis(cfg.timeout_ms).saturating_mul(attempts)
}

pub async fn extract_partial(
	extractor: &dyn ExtractorProvider,
	cfg: &LlmProviderConfig,
	messages: &[Value],
) -> Result<PartialFilter, ExtractionFailure> {
	let budget = call_budget(cfg);
	let call = extractor.extract(cfg, messages);
	let value = match tokio::time::timeout(budget, call).await {
		Ok(Ok(value)) => value,
		Ok(Err(err)) => return Err(ExtractionFailure::Transport { message: err.to_string() }),
		Err(_) => {
			let timeout_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);

			return Err(ExtractionFailure::Timeout { timeout_ms });
		},
	};

	decode(value)
}
