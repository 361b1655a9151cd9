//! OpenAI-compatible chat-completions client for the criteria extractor.

use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use serde_json::{Map, Value};

use crate::{Error, Result};

const FENCE_PATTERN: &str = r"(?s)^\s*```[A-Za-z0-9_-]*\s*(.*?)\s*```\s*$";
/// Requests per [`extract`] call; each one is bounded by the provider's `timeout_ms`.
pub const MAX_ATTEMPTS: usize = 3;

/// Sends `messages` to the configured model and returns the JSON object it answered with.
///
/// Unparseable answers are retried; transport errors are returned immediately.
pub async fn extract(cfg: &hogar_config::LlmProviderConfig, messages: &[Value]) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let mut last_error = None;

	for _ in 0..MAX_ATTEMPTS {
		let res = client.post(&url).headers(headers.clone()).json(&body).send().await?;
		let json: Value = res.error_for_status()?.json().await?;

		match parse_extractor_json(json) {
			Ok(parsed) => return Ok(parsed),
			Err(err) => last_error = Some(err),
		}
	}

	Err(last_error.unwrap_or_else(|| Error::InvalidResponse {
		message: "Extractor response is not valid JSON.".to_string(),
	}))
}

/// Pulls the JSON object out of a chat-completions response.
pub fn parse_extractor_json(json: Value) -> Result<Value> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		return parse_content(content);
	}

	if json.get("choices").is_none() && json.is_object() {
		return Ok(json);
	}

	Err(Error::InvalidResponse {
		message: "Extractor response is missing JSON content.".to_string(),
	})
}

/// Decodes message content, unwrapping a Markdown code fence when present.
pub fn parse_content(content: &str) -> Result<Value> {
	let body = strip_code_fence(content);

	if body.trim().is_empty() {
		return Ok(Value::Object(Map::new()));
	}

	let parsed: Value = serde_json::from_str(body).map_err(|_| Error::InvalidResponse {
		message: "Extractor content is not valid JSON.".to_string(),
	})?;

	if !parsed.is_object() {
		return Err(Error::InvalidResponse {
			message: "Extractor content must be a JSON object.".to_string(),
		});
	}

	Ok(parsed)
}

pub fn strip_code_fence(content: &str) -> &str {
	Regex::new(FENCE_PATTERN)
		.ok()
		.and_then(|re| re.captures(content))
		.and_then(|caps| caps.get(1))
		.map(|inner| inner.as_str())
		.unwrap_or(content)
}
