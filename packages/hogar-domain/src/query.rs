//! Compiles a [`FilterState`] into a storage-agnostic [`QueryPlan`].
//!
//! The plan is a typed expression tree over leaf [`Predicate`]s. Storage adapters render the
//! tree into their own query language; [`Expr::evaluate`] runs the same tree in memory.

use std::collections::HashSet;

use serde::Serialize;

use crate::{
	filter::{FilterState, OperationType},
	listing::PropertyRecord,
	tags::{self, NormalizedTag},
};

pub const PAGE_LIMIT: usize = 10;

/// Free-text relevance term. Comma-separated parts match independently (any part matches).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankTerm {
	pub text: String,
	pub terms: Vec<String>,
}
impl RankTerm {
	pub fn parse(raw: &str) -> Option<Self> {
		let mut seen = HashSet::new();
		let terms: Vec<String> = raw
			.split(',')
			.map(|term| term.trim().to_lowercase())
			.filter(|term| !term.is_empty())
			.filter(|term| seen.insert(term.clone()))
			.collect();

		if terms.is_empty() {
			return None;
		}

		Some(Self { text: raw.trim().to_string(), terms })
	}

	/// Number of parts found in `text`, or `None` when nothing matches.
	pub fn score(&self, text: &str) -> Option<f64> {
		let haystack = text.to_lowercase();
		let hits = self.terms.iter().filter(|term| haystack.contains(term.as_str())).count();

		(hits > 0).then_some(hits as f64)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
	OperationIn(Vec<OperationType>),
	PropertyTypeContains(String),
	LocalityContains(String),
	StyleContains(String),
	BedroomsEq(i32),
	BathroomsEq(i32),
	RoomsAtLeast(i32),
	AreaAtLeast(i32),
	PriceAtMost(f64),
	ViewTypeAnyOf(Vec<String>),
	/// Space and descriptor appear together in one image-tag record.
	HasTag(NormalizedTag),
	TextMatches(RankTerm),
}
impl Predicate {
	pub fn label(&self) -> &'static str {
		match self {
			Self::OperationIn(_) => "in:operation_type",
			Self::PropertyTypeContains(_) => "contains:property_type",
			Self::LocalityContains(_) => "contains:locality",
			Self::StyleContains(_) => "contains:architectural_style",
			Self::BedroomsEq(_) => "eq:bedrooms",
			Self::BathroomsEq(_) => "eq:bathrooms",
			Self::RoomsAtLeast(_) => "gte:rooms",
			Self::AreaAtLeast(_) => "gte:area",
			Self::PriceAtMost(_) => "lte:price",
			Self::ViewTypeAnyOf(_) => "in:view_types",
			Self::HasTag(_) => "tag",
			Self::TextMatches(_) => "text:description",
		}
	}

	pub fn matches(&self, record: &PropertyRecord) -> bool {
		match self {
			Self::OperationIn(ops) =>
				record.operation_type.map(|op| ops.contains(&op)).unwrap_or(false),
			Self::PropertyTypeContains(needle) =>
				contains_ci(record.property_type.as_deref(), needle),
			Self::LocalityContains(needle) => contains_ci(record.locality.as_deref(), needle),
			Self::StyleContains(needle) =>
				contains_ci(record.architectural_style.as_deref(), needle),
			Self::BedroomsEq(value) => record.bedrooms == *value,
			Self::BathroomsEq(value) => record.bathrooms == *value,
			Self::RoomsAtLeast(value) => record.rooms >= *value,
			Self::AreaAtLeast(value) => record.area >= *value,
			Self::PriceAtMost(value) => record.price <= *value,
			Self::ViewTypeAnyOf(wanted) => record
				.view_types
				.iter()
				.any(|view| wanted.iter().any(|w| w.to_lowercase() == view.to_lowercase())),
			Self::HasTag(tag) => record.tags.iter().any(|raw| tag.matches_record(raw)),
			Self::TextMatches(term) => term.score(&record.description).is_some(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
	And(Vec<Expr>),
	Or(Vec<Expr>),
	Not(Box<Expr>),
	Leaf(Predicate),
}
impl Expr {
	/// Evaluates the tree against one listing; on rejection, names the first failing node.
	pub fn evaluate(&self, record: &PropertyRecord) -> (bool, Option<String>) {
		match self {
			Self::And(nodes) => {
				for node in nodes {
					let (passed, reason) = node.evaluate(record);

					if !passed {
						return (false, reason);
					}
				}

				(true, None)
			},
			Self::Or(nodes) => {
				let mut first_reason = None;

				for node in nodes {
					let (passed, reason) = node.evaluate(record);

					if passed {
						return (true, None);
					}
					if first_reason.is_none() {
						first_reason = reason;
					}
				}

				(false, first_reason.or_else(|| Some("or.no_match".to_string())))
			},
			Self::Not(node) => {
				let (passed, reason) = node.evaluate(record);

				if passed { (false, Some("not.true".to_string())) } else { (true, reason) }
			},
			Self::Leaf(predicate) => {
				let matches = predicate.matches(record);

				(matches, Some(predicate.label().to_string()).filter(|_| !matches))
			},
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKey {
	RankDesc,
	PriceAsc,
	IdAsc,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryPlan {
	pub required: Vec<Predicate>,
	/// OR within a group, AND across groups.
	pub include_groups: Vec<Vec<NormalizedTag>>,
	/// Disqualify when ANY of these matches.
	pub exclude_tags: Vec<NormalizedTag>,
	pub rank_term: Option<RankTerm>,
	pub order_by: Vec<OrderKey>,
	pub limit: usize,
	/// Desired pairs dropped because they were also excluded.
	pub conflicts: Vec<NormalizedTag>,
}
impl QueryPlan {
	pub fn expr(&self) -> Expr {
		let mut nodes: Vec<Expr> = self.required.iter().cloned().map(Expr::Leaf).collect();

		for group in &self.include_groups {
			nodes.push(Expr::Or(tag_leaves(group)));
		}

		if !self.exclude_tags.is_empty() {
			nodes.push(Expr::Not(Box::new(Expr::Or(tag_leaves(&self.exclude_tags)))));
		}

		Expr::And(nodes)
	}

	pub fn matches(&self, record: &PropertyRecord) -> bool {
		self.expr().evaluate(record).0
	}

	pub fn is_ranked(&self) -> bool {
		self.rank_term.is_some()
	}
}

pub fn compile(state: &FilterState) -> QueryPlan {
	let mut required = Vec::new();

	match state.operation_type {
		Some(op) => required.push(Predicate::OperationIn(vec![op])),
		None if state.property_type.is_some() =>
			required.push(Predicate::OperationIn(OperationType::ALL.to_vec())),
		None => {},
	}

	if let Some(value) = state.property_type.as_deref() {
		required.push(Predicate::PropertyTypeContains(value.to_string()));
	}
	if let Some(value) = state.locality.as_deref() {
		required.push(Predicate::LocalityContains(value.to_string()));
	}
	if let Some(value) = state.bedrooms_exact {
		required.push(Predicate::BedroomsEq(value));
	}
	if let Some(value) = state.bathrooms_exact {
		required.push(Predicate::BathroomsEq(value));
	}
	if let Some(value) = state.rooms_min {
		required.push(Predicate::RoomsAtLeast(value));
	}
	if let Some(value) = state.price_max {
		required.push(Predicate::PriceAtMost(value));
	}
	if let Some(value) = state.area_min {
		required.push(Predicate::AreaAtLeast(value));
	}
	if let Some(value) = state.architectural_style.as_deref() {
		required.push(Predicate::StyleContains(value.to_string()));
	}
	if !state.view_types.is_empty() {
		required.push(Predicate::ViewTypeAnyOf(state.view_types.clone()));
	}

	let rank_term = state.free_text_query.as_deref().and_then(RankTerm::parse);

	if let Some(term) = rank_term.as_ref() {
		required.push(Predicate::TextMatches(term.clone()));
	}

	let exclude_tags = tags::normalize(&state.excluded_tags);
	let excluded: HashSet<&NormalizedTag> = exclude_tags.iter().collect();
	let (conflicts, include): (Vec<_>, Vec<_>) =
		tags::normalize(&state.desired_tags).into_iter().partition(|tag| excluded.contains(tag));
	let include_groups = if include.is_empty() { Vec::new() } else { vec![include] };
	let mut order_by = Vec::with_capacity(3);

	if rank_term.is_some() {
		order_by.push(OrderKey::RankDesc);
	}

	order_by.extend([OrderKey::PriceAsc, OrderKey::IdAsc]);

	QueryPlan {
		required,
		include_groups,
		exclude_tags,
		rank_term,
		order_by,
		limit: PAGE_LIMIT,
		conflicts,
	}
}

fn tag_leaves(tags: &[NormalizedTag]) -> Vec<Expr> {
	tags.iter().cloned().map(|tag| Expr::Leaf(Predicate::HasTag(tag))).collect()
}

fn contains_ci(value: Option<&str>, needle: &str) -> bool {
	value.map(|v| v.to_lowercase().contains(&needle.trim().to_lowercase())).unwrap_or(false)
}
