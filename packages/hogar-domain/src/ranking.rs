use std::{cmp::Ordering, collections::HashSet};

use crate::{
	listing::PropertyRecord,
	query::{OrderKey, QueryPlan},
};

/// Applies the plan's ordering and limit to whatever the catalog returned.
///
/// Records repeating an already seen id are dropped; the first occurrence wins.
pub fn order(records: Vec<PropertyRecord>, plan: &QueryPlan) -> Vec<PropertyRecord> {
	let mut seen = HashSet::new();
	let mut out: Vec<PropertyRecord> =
		records.into_iter().filter(|record| seen.insert(record.id)).collect();

	out.sort_by(|left, right| compare(left, right, &plan.order_by));
	out.truncate(plan.limit);

	out
}

fn compare(left: &PropertyRecord, right: &PropertyRecord, keys: &[OrderKey]) -> Ordering {
	for key in keys {
		let ordering = match key {
			OrderKey::RankDesc => rank_of(right).total_cmp(&rank_of(left)),
			OrderKey::PriceAsc => left.price.total_cmp(&right.price),
			OrderKey::IdAsc => left.id.cmp(&right.id),
		};

		if ordering != Ordering::Equal {
			return ordering;
		}
	}

	left.id.cmp(&right.id)
}

fn rank_of(record: &PropertyRecord) -> f64 {
	record.rank.unwrap_or(0.0)
}
