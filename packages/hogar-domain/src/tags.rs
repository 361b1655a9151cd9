//! Canonical `(space, descriptor)` tags derived from free-form phrases.
//!
//! A phrase such as "cocina grande y luminosa" names a space ("cocina") followed by the
//! descriptors that qualify it. Phrases without any descriptor are bare nouns and never become
//! structured tags; those belong in the free-text rank term instead.

use std::{collections::HashSet, fmt};

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

pub const STOP_WORDS: [&str; 8] = ["y", "o", "con", "sin", "and", "or", "with", "without"];

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NormalizedTag {
	pub space: String,
	pub descriptor: String,
}
impl NormalizedTag {
	pub fn new(space: impl Into<String>, descriptor: impl Into<String>) -> Self {
		Self { space: space.into(), descriptor: descriptor.into() }
	}

	/// True when one raw image-tag record mentions both the space and the descriptor.
	///
	/// Records are comma-separated keyword lists, so they split on punctuation as well.
	pub fn matches_record(&self, record: &str) -> bool {
		let tokens = record_tokens(record);

		tokens.iter().any(|token| token == &self.space)
			&& tokens.iter().any(|token| token == &self.descriptor)
	}
}
impl fmt::Display for NormalizedTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.space, self.descriptor)
	}
}

pub fn normalize<S>(phrases: &[S]) -> Vec<NormalizedTag>
where
	S: AsRef<str>,
{
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for phrase in phrases {
		for tag in normalize_phrase(phrase.as_ref()) {
			if seen.insert(tag.clone()) {
				out.push(tag);
			}
		}
	}

	out
}

pub fn normalize_phrase(phrase: &str) -> Vec<NormalizedTag> {
	let tokens = phrase_tokens(phrase);
	let Some((space, rest)) = tokens.split_first() else {
		return Vec::new();
	};

	rest.iter()
		.filter(|token| !is_stop_word(token))
		.map(|descriptor| NormalizedTag::new(space.as_str(), descriptor.as_str()))
		.collect()
}

/// Rebuilds a phrase from a space and its descriptors, the inverse of [`normalize_phrase`].
pub fn compose_phrase(space: &str, descriptors: &[&str]) -> String {
	let mut phrase = space.to_string();

	for descriptor in descriptors {
		phrase.push(' ');
		phrase.push_str(descriptor);
	}

	phrase
}

pub fn is_stop_word(token: &str) -> bool {
	STOP_WORDS.contains(&token)
}

/// Phrase tokens are whitespace-delimited; "living-comedor" stays one token.
fn phrase_tokens(phrase: &str) -> Vec<String> {
	fold(phrase).split_whitespace().map(str::to_string).collect()
}

fn record_tokens(record: &str) -> Vec<String> {
	fold(record).unicode_words().map(str::to_string).collect()
}

fn fold(text: &str) -> String {
	text.nfc().collect::<String>().to_lowercase()
}
