use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use hogar_domain::{
	filter::{self, ClarificationReason, FilterState, PartialFilter},
	listing::PropertyRecord,
	query, ranking,
};

use crate::{
	Error, HogarService, Result,
	extract::{self, ExtractionFailure},
	session::{SessionRecord, TurnRole},
};

pub const DEGRADED_CATALOG: &str = "catalog-unavailable";
pub const DEGRADED_EXTRACTION: &str = "extraction-failed";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
	#[serde(default)]
	pub session_id: Option<String>,
	pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
	pub session_id: String,
	pub filter_state: FilterState,
	pub properties: Vec<PropertyRecord>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub needs_clarification: Option<ClarificationReason>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub listing: Option<PropertyRecord>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub degraded: Option<String>,
}

impl HogarService {
	/// Runs one conversational turn: extract, merge, query, rank, then record the turn.
	///
	/// Turns on the same session run one at a time in arrival order.
	pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
		let message = req.message.trim();

		if message.is_empty() {
			return Err(Error::InvalidRequest { message: "message must be non-empty.".to_string() });
		}

		let session_id = req
			.session_id
			.as_deref()
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.map(str::to_string)
			.unwrap_or_else(|| Uuid::new_v4().to_string());
		let mut session = self.sessions.lock(&session_id).await;
		let history_text = session.history_text(self.cfg.chat.history_max_turns as usize);
		let messages = extract::build_messages(
			message,
			&history_text,
			self.cfg.chat.household_rooms_hint.as_deref(),
		);
		let (partial, extraction_degraded) = match extract::extract_partial(
			self.providers.extractor.as_ref(),
			&self.cfg.providers.llm_extractor,
			&messages,
		)
		.await
		{
			Ok(partial) => (partial, false),
			Err(err) => {
				log_extraction_failure(
					&session_id,
					&self.cfg.providers.llm_extractor.provider_id,
					&err,
				);

				(PartialFilter::default(), true)
			},
		};
		let degraded = extraction_degraded.then(|| DEGRADED_EXTRACTION.to_string());
		let now = OffsetDateTime::now_utc();

		if let Some(index) = partial.requested_listing
			&& !partial.reset_requested()
		{
			return Ok(detail_turn(&mut session, message, index, degraded, now));
		}

		let next = filter::apply_turn(&session.state, &partial);

		if let Some(reason) = next.clarification() {
			session.state = next.clone();
			session.push_turn(TurnRole::User, message, now);
			session.push_turn(
				TurnRole::Assistant,
				format!("needs clarification: {}", reason.as_str()),
				now,
			);

			tracing::info!(
				session_id = %session_id,
				reason = reason.as_str(),
				"Chat turn needs clarification."
			);

			return Ok(ChatResponse {
				session_id,
				filter_state: next,
				properties: Vec::new(),
				needs_clarification: Some(reason),
				listing: None,
				degraded,
			});
		}

		let plan = query::compile(&next);

		if !plan.conflicts.is_empty() {
			let conflicts: Vec<String> = plan.conflicts.iter().map(ToString::to_string).collect();

			tracing::warn!(
				session_id = %session_id,
				conflicts = ?conflicts,
				"Desired and excluded tags overlap. Exclusion wins."
			);
		}

		let timeout = Duration::from_millis(self.cfg.catalog.query_timeout_ms);
		let records =
			match tokio::time::timeout(timeout, self.providers.catalog.search(&plan)).await {
				Ok(Ok(records)) => records,
				Ok(Err(err)) => {
					tracing::warn!(error = %err, session_id = %session_id, "Catalog query failed.");

					return Ok(catalog_unavailable(session_id, &session));
				},
				Err(_) => {
					tracing::warn!(
						session_id = %session_id,
						timeout_ms = self.cfg.catalog.query_timeout_ms,
						"Catalog query timed out."
					);

					return Ok(catalog_unavailable(session_id, &session));
				},
			};
		let properties = ranking::order(records, &plan);

		session.state = next.clone();
		session.last_results = properties.clone();
		session.push_turn(TurnRole::User, message, now);
		session.push_turn(
			TurnRole::Assistant,
			format!("found {} properties", properties.len()),
			now,
		);

		tracing::info!(session_id = %session_id, results = properties.len(), "Chat turn served.");

		Ok(ChatResponse {
			session_id,
			filter_state: next,
			properties,
			needs_clarification: None,
			listing: None,
			degraded,
		})
	}
}

/// Serves a question about one listing of the previous page without touching the criteria.
fn detail_turn(
	session: &mut SessionRecord,
	message: &str,
	index: u32,
	degraded: Option<String>,
	now: OffsetDateTime,
) -> ChatResponse {
	let listing = (index as usize)
		.checked_sub(1)
		.and_then(|position| session.last_results.get(position))
		.cloned();
	let summary = match listing.as_ref() {
		Some(record) => format!("listing {index}: {}", record.name),
		None => format!("listing {index} is not in the last results"),
	};

	session.push_turn(TurnRole::User, message, now);
	session.push_turn(TurnRole::Assistant, summary, now);

	ChatResponse {
		session_id: session.session_id.clone(),
		filter_state: session.state.clone(),
		properties: session.last_results.clone(),
		needs_clarification: listing.is_none().then_some(ClarificationReason::InvalidListing),
		listing,
		degraded,
	}
}

fn catalog_unavailable(session_id: String, session: &SessionRecord) -> ChatResponse {
	ChatResponse {
		session_id,
		filter_state: session.state.clone(),
		properties: Vec::new(),
		needs_clarification: None,
		listing: None,
		degraded: Some(DEGRADED_CATALOG.to_string()),
	}
}

fn log_extraction_failure(session_id: &str, provider_id: &str, err: &ExtractionFailure) {
	tracing::warn!(
		error = %err,
		session_id,
		provider_id,
		"Extractor output discarded. Continuing with an empty filter."
	);
}
