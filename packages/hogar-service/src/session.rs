//! Per-session conversation state with one async lock per session.

use std::{
	collections::HashMap,
	sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::{Mutex, OwnedMutexGuard};

use hogar_domain::{filter::FilterState, listing::PropertyRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
	User,
	Assistant,
}
impl TurnRole {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::User => "user",
			Self::Assistant => "assistant",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
	pub role: TurnRole,
	pub text: String,
	#[serde(with = "time::serde::rfc3339")]
	pub at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
	pub session_id: String,
	pub history: Vec<Turn>,
	pub state: FilterState,
	/// Page served by the last successful search; detail requests index into it.
	pub last_results: Vec<PropertyRecord>,
}
impl SessionRecord {
	pub fn new(session_id: impl Into<String>) -> Self {
		Self {
			session_id: session_id.into(),
			history: Vec::new(),
			state: FilterState::default(),
			last_results: Vec::new(),
		}
	}

	pub fn push_turn(&mut self, role: TurnRole, text: impl Into<String>, at: OffsetDateTime) {
		self.history.push(Turn { role, text: text.into(), at });
	}

	/// Renders the most recent `max_turns` turns as `[ts] role: text` lines.
	pub fn history_text(&self, max_turns: usize) -> String {
		let skip = self.history.len().saturating_sub(max_turns);

		self.history
			.iter()
			.skip(skip)
			.map(|turn| {
				let ts = turn.at.format(&Rfc3339).unwrap_or_default();

				format!("[{ts}] {}: {}", turn.role.as_str(), turn.text)
			})
			.collect::<Vec<_>>()
			.join("\n")
	}
}

/// Session records keyed by id.
///
/// The map lock only guards lookup and insertion. Each record sits behind its own async mutex, so
/// turns on one session queue up in arrival order while other sessions proceed independently.
#[derive(Default)]
pub struct SessionStore {
	sessions: RwLock<HashMap<String, Arc<Mutex<SessionRecord>>>>,
}
impl SessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Exclusive guard over one session, created empty when unseen.
	pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<SessionRecord> {
		self.slot(session_id).lock_owned().await
	}

	/// Snapshot of one session. Must not be awaited while holding [`Self::lock`] on the same id.
	pub async fn get(&self, session_id: &str) -> SessionRecord {
		self.lock(session_id).await.clone()
	}

	/// Replaces one session. Must not be awaited while holding [`Self::lock`] on the same id.
	pub async fn put(&self, session_id: &str, record: SessionRecord) {
		*self.lock(session_id).await = record;
	}

	pub fn contains(&self, session_id: &str) -> bool {
		self.sessions.read().unwrap_or_else(|err| err.into_inner()).contains_key(session_id)
	}

	pub fn len(&self) -> usize {
		self.sessions.read().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn slot(&self, session_id: &str) -> Arc<Mutex<SessionRecord>> {
		if let Some(slot) =
			self.sessions.read().unwrap_or_else(|err| err.into_inner()).get(session_id)
		{
			return slot.clone();
		}

		let mut sessions = self.sessions.write().unwrap_or_else(|err| err.into_inner());

		sessions
			.entry(session_id.to_string())
			.or_insert_with(|| Arc::new(Mutex::new(SessionRecord::new(session_id))))
			.clone()
	}
}
