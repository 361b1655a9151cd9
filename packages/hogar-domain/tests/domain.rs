use hogar_domain::{
	filter::{self, ClarificationReason, FilterState, OperationType, PartialFilter},
	listing::PropertyRecord,
	query::{self, Expr, OrderKey, PAGE_LIMIT, Predicate},
	ranking,
	tags::{self, NormalizedTag},
};

fn listing(id: i64, price: f64) -> PropertyRecord {
	PropertyRecord {
		id,
		name: format!("Propiedad {id}"),
		description: "Casa luminosa con patio".to_string(),
		address: format!("Calle {id}"),
		price,
		area: 120,
		bedrooms: 3,
		bathrooms: 2,
		rooms: 5,
		operation_type: Some(OperationType::Sale),
		locality: Some("Villa María".to_string()),
		property_type: Some("Casa".to_string()),
		architectural_style: Some("Moderno".to_string()),
		view_types: vec!["Ciudad".to_string()],
		tags: vec!["cocina, grande, luminosa".to_string()],
		rank: None,
	}
}

fn cordoba_sale() -> FilterState {
	FilterState {
		operation_type: Some(OperationType::Sale),
		property_type: Some("casa".to_string()),
		locality: Some("Córdoba".to_string()),
		price_max: Some(300_000.0),
		bedrooms_exact: Some(3),
		desired_tags: vec!["cocina grande".to_string()],
		..Default::default()
	}
}

#[test]
fn reset_yields_empty_state_regardless_of_payload() {
	let incoming = PartialFilter {
		reset_search: Some(true),
		locality: Some("Rosario".to_string()),
		price_max: Some(1.0),
		..Default::default()
	};
	let merged = filter::merge(&cordoba_sale(), &incoming, incoming.reset_requested());

	assert!(merged.is_empty());
	assert_eq!(merged, FilterState::default());
}

#[test]
fn reset_turn_keeps_only_criteria_mentioned_with_it() {
	let incoming = PartialFilter {
		reset_search: Some(true),
		property_type: Some("depto".to_string()),
		..Default::default()
	};
	let next = filter::apply_turn(&cordoba_sale(), &incoming);

	assert_eq!(
		next,
		FilterState { property_type: Some("depto".to_string()), ..Default::default() }
	);
	assert_eq!(next.clarification(), Some(ClarificationReason::LocalityMissing));
}

#[test]
fn later_scalar_overrides_prior_value() {
	let incoming = PartialFilter { price_max: Some(250_000.0), ..Default::default() };
	let merged = filter::merge(&cordoba_sale(), &incoming, false);

	assert_eq!(merged.price_max, Some(250_000.0));
	assert_eq!(merged.locality.as_deref(), Some("Córdoba"));
}

#[test]
fn empty_partial_keeps_prior_state() {
	let prior = cordoba_sale();

	assert_eq!(filter::merge(&prior, &PartialFilter::default(), false), prior);
}

#[test]
fn non_empty_list_replaces_prior_list() {
	let incoming = PartialFilter {
		desired_tags: Some(vec!["patio amplio".to_string()]),
		..Default::default()
	};
	let merged = filter::merge(&cordoba_sale(), &incoming, false);

	assert_eq!(merged.desired_tags, vec!["patio amplio".to_string()]);
}

#[test]
fn normalizer_splits_descriptors_and_skips_bare_nouns() {
	assert_eq!(
		tags::normalize(&["cocina grande y luminosa"]),
		vec![NormalizedTag::new("cocina", "grande"), NormalizedTag::new("cocina", "luminosa")]
	);
	assert!(tags::normalize(&["pileta"]).is_empty());
}

#[test]
fn excluded_pair_wins_over_desired_pair() {
	let incoming = PartialFilter {
		desired_tags: Some(vec!["garage pequeño".to_string(), "cocina grande".to_string()]),
		excluded_tags: Some(vec!["garage pequeño".to_string()]),
		..Default::default()
	};
	let merged = filter::merge(&FilterState::default(), &incoming, false);
	let plan = query::compile(&merged);

	assert_eq!(merged.desired_tags, vec!["cocina grande".to_string()]);
	assert_eq!(plan.include_groups, vec![vec![NormalizedTag::new("cocina", "grande")]]);
	assert_eq!(plan.exclude_tags, vec![NormalizedTag::new("garage", "pequeño")]);
	assert!(plan.conflicts.is_empty());
}

#[test]
fn hyphenated_words_survive_exclusion_rewrite() {
	let incoming = PartialFilter {
		desired_tags: Some(vec!["living-comedor amplio y luminoso".to_string()]),
		excluded_tags: Some(vec!["living-comedor luminoso".to_string()]),
		..Default::default()
	};
	let merged = filter::merge(&FilterState::default(), &incoming, false);
	let plan = query::compile(&merged);

	assert_eq!(merged.desired_tags, vec!["living-comedor amplio".to_string()]);
	assert_eq!(plan.include_groups, vec![vec![NormalizedTag::new("living-comedor", "amplio")]]);
	assert_eq!(plan.exclude_tags, vec![NormalizedTag::new("living-comedor", "luminoso")]);
}

#[test]
fn compile_reports_overlap_in_unmerged_state() {
	let state = FilterState {
		desired_tags: vec!["garage pequeño".to_string()],
		excluded_tags: vec!["garage pequeño".to_string()],
		..Default::default()
	};
	let plan = query::compile(&state);

	assert!(plan.include_groups.is_empty());
	assert_eq!(plan.conflicts, vec![NormalizedTag::new("garage", "pequeño")]);
	assert_eq!(state.conflicting_tags(), plan.conflicts);
}

#[test]
fn completeness_gate_reports_missing_fields() {
	let type_only = FilterState { property_type: Some("casa".to_string()), ..Default::default() };
	let locality_only =
		FilterState { locality: Some("Córdoba".to_string()), ..Default::default() };

	assert_eq!(type_only.clarification(), Some(ClarificationReason::LocalityMissing));
	assert_eq!(locality_only.clarification(), Some(ClarificationReason::TypeMissing));
	assert_eq!(FilterState::default().clarification(), Some(ClarificationReason::BothMissing));
	assert!(cordoba_sale().is_query_ready());
}

#[test]
fn property_type_without_operation_allows_both_operations() {
	let state = FilterState {
		property_type: Some("depto".to_string()),
		locality: Some("Córdoba".to_string()),
		..Default::default()
	};
	let plan = query::compile(&state);

	assert_eq!(plan.required[0], Predicate::OperationIn(OperationType::ALL.to_vec()));
	assert_eq!(plan.order_by, vec![OrderKey::PriceAsc, OrderKey::IdAsc]);
	assert_eq!(plan.limit, PAGE_LIMIT);
}

#[test]
fn free_text_adds_rank_ordering_and_text_predicate() {
	let state =
		FilterState { free_text_query: Some("pileta, quincho".to_string()), ..cordoba_sale() };
	let plan = query::compile(&state);

	assert_eq!(plan.order_by, vec![OrderKey::RankDesc, OrderKey::PriceAsc, OrderKey::IdAsc]);
	assert!(plan.required.iter().any(|predicate| matches!(predicate, Predicate::TextMatches(_))));
	assert!(plan.is_ranked());
}

#[test]
fn expression_tree_rejects_excluded_tag_and_reports_reason() {
	let state = FilterState {
		property_type: Some("casa".to_string()),
		locality: Some("villa maría".to_string()),
		excluded_tags: vec!["garage pequeño".to_string()],
		..Default::default()
	};
	let plan = query::compile(&state);
	let clean = listing(1, 100.0);
	let mut tagged = listing(2, 100.0);

	tagged.tags.push("Garage, pequeño, techado".to_string());

	assert_eq!(plan.expr().evaluate(&clean), (true, None));
	assert_eq!(plan.expr().evaluate(&tagged), (false, Some("not.true".to_string())));
}

#[test]
fn expression_tree_names_first_failing_leaf() {
	let state = FilterState { bedrooms_exact: Some(4), ..cordoba_sale() };
	let expr = query::compile(&state).expr();
	let (passed, reason) = expr.evaluate(&listing(1, 100.0));

	assert!(!passed);
	assert_eq!(reason.as_deref(), Some("contains:locality"));
	assert!(matches!(expr, Expr::And(_)));
}

#[test]
fn include_group_needs_only_one_pair() {
	let state = FilterState {
		property_type: Some("casa".to_string()),
		locality: Some("Villa".to_string()),
		desired_tags: vec!["patio amplio".to_string(), "cocina luminosa".to_string()],
		..Default::default()
	};
	let plan = query::compile(&state);

	assert!(plan.matches(&listing(1, 1.0)));
}

#[test]
fn equal_prices_fall_back_to_id_order() {
	let plan = query::compile(&cordoba_sale());
	let ordered = ranking::order(
		vec![listing(9, 100.0), listing(3, 100.0), listing(5, 50.0), listing(3, 100.0)],
		&plan,
	);
	let ids: Vec<i64> = ordered.iter().map(|record| record.id).collect();

	assert_eq!(ids, vec![5, 3, 9]);
}

#[test]
fn rank_orders_before_price_and_page_is_truncated() {
	let state = FilterState { free_text_query: Some("patio".to_string()), ..cordoba_sale() };
	let plan = query::compile(&state);
	let mut records: Vec<PropertyRecord> =
		(1..=15).map(|id| listing(id, 1_000.0 - id as f64)).collect();

	records[0].rank = Some(0.9);
	records[1].rank = Some(0.4);

	let ordered = ranking::order(records, &plan);

	assert_eq!(ordered.len(), PAGE_LIMIT);
	assert_eq!(ordered[0].id, 1);
	assert_eq!(ordered[1].id, 2);
	assert_eq!(ordered[2].id, 15);
}

#[test]
fn filter_state_round_trips_through_camel_case_json() {
	let json = serde_json::to_value(cordoba_sale()).expect("Failed to serialize state.");

	assert_eq!(json["operationType"], "SALE");
	assert_eq!(json["priceMax"], 300_000.0);

	let decoded: FilterState = serde_json::from_value(json).expect("Failed to decode state.");

	assert_eq!(decoded, cordoba_sale());
}
