//! Session filter state and the rules for folding a turn's partial filter into it.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::tags::{self, NormalizedTag};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationType {
	Sale,
	Rent,
}
impl OperationType {
	pub const ALL: [Self; 2] = [Self::Sale, Self::Rent];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Sale => "SALE",
			Self::Rent => "RENT",
		}
	}
}
impl FromStr for OperationType {
	type Err = UnknownOperation;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_lowercase().as_str() {
			"sale" | "sell" | "buy" | "purchase" | "compra" | "comprar" | "venta" | "vender" =>
				Ok(Self::Sale),
			"rent" | "lease" | "rental" | "alquiler" | "alquilar" | "renta" | "arriendo" =>
				Ok(Self::Rent),
			_ => Err(UnknownOperation(raw.to_string())),
		}
	}
}
impl fmt::Display for OperationType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl Serialize for OperationType {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(self.as_str())
	}
}
impl<'de> Deserialize<'de> for OperationType {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		raw.parse().map_err(serde::de::Error::custom)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownOperation(pub String);
impl fmt::Display for UnknownOperation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown operation type '{}'", self.0)
	}
}
impl std::error::Error for UnknownOperation {}

/// Why a state cannot be queried yet, or why a turn could not be served as asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClarificationReason {
	BothMissing,
	TypeMissing,
	LocalityMissing,
	InvalidListing,
}
impl ClarificationReason {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::BothMissing => "both-missing",
			Self::TypeMissing => "type-missing",
			Self::LocalityMissing => "locality-missing",
			Self::InvalidListing => "invalid-listing",
		}
	}
}

/// Accumulated search criteria for one conversation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
	pub operation_type: Option<OperationType>,
	pub property_type: Option<String>,
	pub locality: Option<String>,
	pub bedrooms_exact: Option<i32>,
	pub bathrooms_exact: Option<i32>,
	pub rooms_min: Option<i32>,
	pub price_max: Option<f64>,
	pub area_min: Option<i32>,
	pub architectural_style: Option<String>,
	pub view_types: Vec<String>,
	pub desired_tags: Vec<String>,
	pub excluded_tags: Vec<String>,
	pub free_text_query: Option<String>,
}
impl FilterState {
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}

	pub fn is_query_ready(&self) -> bool {
		self.clarification().is_none()
	}

	pub fn clarification(&self) -> Option<ClarificationReason> {
		match (non_blank(&self.property_type), non_blank(&self.locality)) {
			(true, true) => None,
			(false, false) => Some(ClarificationReason::BothMissing),
			(false, true) => Some(ClarificationReason::TypeMissing),
			(true, false) => Some(ClarificationReason::LocalityMissing),
		}
	}

	/// Normalized pairs present on both sides. Empty whenever the state came out of [`merge`].
	pub fn conflicting_tags(&self) -> Vec<NormalizedTag> {
		let excluded: HashSet<_> = tags::normalize(&self.excluded_tags).into_iter().collect();

		tags::normalize(&self.desired_tags)
			.into_iter()
			.filter(|tag| excluded.contains(tag))
			.collect()
	}
}

/// The criteria mentioned in a single turn, as decoded from the extractor.
///
/// Every field is optional. `None` means "not mentioned", never "cleared".
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialFilter {
	pub operation_type: Option<OperationType>,
	pub property_type: Option<String>,
	pub locality: Option<String>,
	pub bedrooms_exact: Option<i32>,
	pub bathrooms_exact: Option<i32>,
	pub rooms_min: Option<i32>,
	pub price_max: Option<f64>,
	pub area_min: Option<i32>,
	pub architectural_style: Option<String>,
	pub view_types: Option<Vec<String>>,
	pub desired_tags: Option<Vec<String>>,
	pub excluded_tags: Option<Vec<String>>,
	pub free_text_query: Option<String>,
	pub reset_search: Option<bool>,
	/// 1-based position in the previous result page the user asked about.
	pub requested_listing: Option<u32>,
}
impl PartialFilter {
	/// Drops blank strings and blank list items so they read as "not mentioned".
	pub fn normalized(mut self) -> Self {
		for field in [
			&mut self.property_type,
			&mut self.locality,
			&mut self.architectural_style,
			&mut self.free_text_query,
		] {
			*field = field.take().map(|value| value.trim().to_string()).filter(|v| !v.is_empty());
		}
		for list in [&mut self.view_types, &mut self.desired_tags, &mut self.excluded_tags] {
			*list = list.take().map(|items| {
				items
					.into_iter()
					.map(|item| item.trim().to_string())
					.filter(|item| !item.is_empty())
					.collect()
			});
		}

		self
	}

	pub fn reset_requested(&self) -> bool {
		self.reset_search.unwrap_or(false)
	}
}

pub fn merge(prior: &FilterState, incoming: &PartialFilter, reset_requested: bool) -> FilterState {
	if reset_requested {
		return FilterState::default();
	}

	let mut next = prior.clone();

	overwrite(&mut next.operation_type, incoming.operation_type);
	overwrite(&mut next.property_type, incoming.property_type.clone());
	overwrite(&mut next.locality, incoming.locality.clone());
	overwrite(&mut next.bedrooms_exact, incoming.bedrooms_exact);
	overwrite(&mut next.bathrooms_exact, incoming.bathrooms_exact);
	overwrite(&mut next.rooms_min, incoming.rooms_min);
	overwrite(&mut next.price_max, incoming.price_max);
	overwrite(&mut next.area_min, incoming.area_min);
	overwrite(&mut next.architectural_style, incoming.architectural_style.clone());
	overwrite(&mut next.free_text_query, incoming.free_text_query.clone());

	replace_list(&mut next.view_types, incoming.view_types.as_deref(), dedup_case_insensitive);
	replace_list(&mut next.desired_tags, incoming.desired_tags.as_deref(), <[String]>::to_vec);
	replace_list(&mut next.excluded_tags, incoming.excluded_tags.as_deref(), <[String]>::to_vec);

	enforce_disjoint_tags(&mut next);

	next
}

/// Folds one turn into the session state.
///
/// A reset turn first clears everything, then the criteria mentioned alongside the reset start the
/// new search ("forget all that, I want a flat" keeps only the flat).
pub fn apply_turn(prior: &FilterState, incoming: &PartialFilter) -> FilterState {
	if incoming.reset_requested() {
		let cleared = merge(prior, incoming, true);

		return merge(&cleared, incoming, false);
	}

	merge(prior, incoming, false)
}

/// Strips excluded pairs out of the desired phrases; exclusion always wins.
///
/// Returns the pairs that were removed.
pub fn enforce_disjoint_tags(state: &mut FilterState) -> Vec<NormalizedTag> {
	let excluded: HashSet<_> = tags::normalize(&state.excluded_tags).into_iter().collect();

	if excluded.is_empty() {
		return Vec::new();
	}

	let mut removed = Vec::new();
	let mut kept_phrases = Vec::with_capacity(state.desired_tags.len());

	for phrase in &state.desired_tags {
		let pairs = tags::normalize_phrase(phrase);

		if pairs.iter().all(|pair| !excluded.contains(pair)) {
			kept_phrases.push(phrase.clone());

			continue;
		}

		let mut descriptors = Vec::new();

		for pair in &pairs {
			if excluded.contains(pair) {
				removed.push(pair.clone());
			} else {
				descriptors.push(pair.descriptor.as_str());
			}
		}

		if let Some(first) = pairs.first()
			&& !descriptors.is_empty()
		{
			kept_phrases.push(tags::compose_phrase(&first.space, &descriptors));
		}
	}

	state.desired_tags = kept_phrases;

	removed
}

fn overwrite<T>(slot: &mut Option<T>, incoming: Option<T>) {
	if let Some(value) = incoming {
		*slot = Some(value);
	}
}

fn replace_list(
	slot: &mut Vec<String>,
	incoming: Option<&[String]>,
	prepare: fn(&[String]) -> Vec<String>,
) {
	if let Some(items) = incoming
		&& !items.is_empty()
	{
		*slot = prepare(items);
	}
}

fn dedup_case_insensitive(items: &[String]) -> Vec<String> {
	let mut seen = HashSet::new();

	items.iter().filter(|item| seen.insert(item.to_lowercase())).cloned().collect()
}

fn non_blank(value: &Option<String>) -> bool {
	value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}
