//! Renders a [`QueryPlan`] into one parameterized catalog query.

use sqlx::{Postgres, QueryBuilder};

use hogar_domain::{
	listing::PropertyRecord,
	query::{Expr, OrderKey, Predicate, QueryPlan, RankTerm},
	tags::NormalizedTag,
};

use crate::{
	Error, Result,
	db::Db,
	models::{self, PropertyRow},
};

const TEXT_SEARCH_CONFIG: &str = "spanish";
const TAG_SEPARATOR_PATTERN: &str = "[[:space:][:punct:]]+";

pub async fn search(
	db: &Db,
	plan: &QueryPlan,
	require_images: bool,
) -> Result<Vec<PropertyRecord>> {
	let mut builder = build_search(plan, require_images)?;

	tracing::debug!(sql = builder.sql(), "Catalog query built.");

	let rows: Vec<PropertyRow> = builder.build_query_as().fetch_all(&db.pool).await?;

	Ok(rows.into_iter().map(PropertyRecord::from).collect())
}

pub fn build_search(
	plan: &QueryPlan,
	require_images: bool,
) -> Result<QueryBuilder<'static, Postgres>> {
	if plan.limit == 0 {
		return Err(Error::InvalidArgument("Query limit must be greater than zero.".to_string()));
	}

	let limit = i64::try_from(plan.limit)
		.map_err(|_| Error::InvalidArgument("Query limit is out of range.".to_string()))?;
	let mut builder = QueryBuilder::new(
		"\
SELECT
	p.id::int8 AS id,
	p.nombre AS name,
	p.descripcion AS description,
	p.direccion AS address,
	p.precio AS price,
	p.superficie AS area,
	p.\"cantidadDormitorios\" AS bedrooms,
	p.\"cantidadBanios\" AS bathrooms,
	p.\"cantidadAmbientes\" AS rooms,
	p.\"tipoOperacion\" AS operation_code,
	l.nombre AS locality,
	tp.nombre AS property_type,
	ea.nombre AS architectural_style,
	COALESCE((
		SELECT array_agg(tv.nombre::text ORDER BY tv.nombre)
		FROM propiedad_tipo_visualizacion ptv
		JOIN tipo_de_visualizacion tv ON tv.id = ptv.tipo_visualizacion_id
		WHERE ptv.propiedad_id = p.id
	), ARRAY[]::text[]) AS view_types,
	COALESCE((
		SELECT array_agg(i.tags_visuales ORDER BY i.id)
		FROM imagen2d i
		WHERE i.propiedad_id = p.id AND i.tags_visuales IS NOT NULL
	), ARRAY[]::text[]) AS tags,
	",
	);

	push_relevance(&mut builder, plan.rank_term.as_ref());
	builder.push(
		" AS relevance
FROM propiedad p
LEFT JOIN localidad l ON p.localidad_id = l.id
LEFT JOIN tipo_de_propiedad tp ON p.\"tipoDePropiedad_id\" = tp.id
LEFT JOIN estilo_arquitectonico ea ON p.\"estiloArquitectonico_id\" = ea.id
WHERE ",
	);
	push_expr(&mut builder, &plan.expr());

	if require_images {
		builder.push(" AND EXISTS (SELECT 1 FROM imagen2d i WHERE i.propiedad_id = p.id)");
	}

	builder.push(" ORDER BY ");

	let mut order = builder.separated(", ");

	for key in &plan.order_by {
		order.push(match key {
			OrderKey::RankDesc => "relevance DESC",
			OrderKey::PriceAsc => "p.precio ASC",
			OrderKey::IdAsc => "p.id ASC",
		});
	}

	builder.push(" LIMIT ");
	builder.push_bind(limit);

	Ok(builder)
}

fn push_relevance(builder: &mut QueryBuilder<'static, Postgres>, term: Option<&RankTerm>) {
	let Some(term) = term else {
		builder.push("NULL::float8");

		return;
	};

	builder.push("ts_rank(to_tsvector('");
	builder.push(TEXT_SEARCH_CONFIG);
	builder.push("', p.descripcion), ");

	for (idx, part) in term.terms.iter().enumerate() {
		if idx > 0 {
			builder.push(" || ");
		}

		builder.push("plainto_tsquery('");
		builder.push(TEXT_SEARCH_CONFIG);
		builder.push("', ");
		builder.push_bind(part.clone());
		builder.push(")");
	}

	builder.push(")::float8");
}

fn push_expr(builder: &mut QueryBuilder<'static, Postgres>, expr: &Expr) {
	match expr {
		Expr::And(nodes) => push_group(builder, nodes, " AND ", "TRUE"),
		Expr::Or(nodes) => push_group(builder, nodes, " OR ", "FALSE"),
		Expr::Not(node) => {
			builder.push("NOT ");
			push_expr(builder, node);
		},
		Expr::Leaf(predicate) => push_predicate(builder, predicate),
	}
}

fn push_group(
	builder: &mut QueryBuilder<'static, Postgres>,
	nodes: &[Expr],
	joiner: &str,
	identity: &str,
) {
	if nodes.is_empty() {
		builder.push(identity);

		return;
	}

	builder.push("(");

	for (idx, node) in nodes.iter().enumerate() {
		if idx > 0 {
			builder.push(joiner);
		}

		push_expr(builder, node);
	}

	builder.push(")");
}

fn push_predicate(builder: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
	match predicate {
		Predicate::OperationIn(ops) => {
			let codes: Vec<String> =
				ops.iter().map(|op| models::operation_code(*op).to_string()).collect();

			builder.push("p.\"tipoOperacion\" = ANY(");
			builder.push_bind(codes);
			builder.push(")");
		},
		Predicate::PropertyTypeContains(value) => push_contains(builder, "tp.nombre", value),
		Predicate::LocalityContains(value) => push_contains(builder, "l.nombre", value),
		Predicate::StyleContains(value) => push_contains(builder, "ea.nombre", value),
		Predicate::BedroomsEq(value) =>
			push_compare(builder, "p.\"cantidadDormitorios\" = ", *value),
		Predicate::BathroomsEq(value) => push_compare(builder, "p.\"cantidadBanios\" = ", *value),
		Predicate::RoomsAtLeast(value) =>
			push_compare(builder, "p.\"cantidadAmbientes\" >= ", *value),
		Predicate::AreaAtLeast(value) => push_compare(builder, "p.superficie >= ", *value),
		Predicate::PriceAtMost(value) => {
			builder.push("p.precio <= ");
			builder.push_bind(*value);
		},
		Predicate::ViewTypeAnyOf(names) => {
			let lowered: Vec<String> =
				names.iter().map(|name| name.trim().to_lowercase()).collect();

			builder.push(
				"EXISTS (SELECT 1 FROM propiedad_tipo_visualizacion ptv \
				 JOIN tipo_de_visualizacion tv ON tv.id = ptv.tipo_visualizacion_id \
				 WHERE ptv.propiedad_id = p.id AND lower(tv.nombre) = ANY(",
			);
			builder.push_bind(lowered);
			builder.push("))");
		},
		Predicate::HasTag(tag) => push_tag(builder, tag),
		Predicate::TextMatches(term) => {
			builder.push("(");

			for (idx, part) in term.terms.iter().enumerate() {
				if idx > 0 {
					builder.push(" OR ");
				}

				builder.push("p.descripcion ILIKE ");
				builder.push_bind(like_pattern(part));
			}

			builder.push(")");
		},
	}
}

fn push_contains(builder: &mut QueryBuilder<'static, Postgres>, column: &str, value: &str) {
	builder.push(column);
	builder.push(" ILIKE ");
	builder.push_bind(like_pattern(value));
}

fn push_compare(builder: &mut QueryBuilder<'static, Postgres>, lhs: &str, value: i32) {
	builder.push(lhs);
	builder.push_bind(value);
}

/// Space and descriptor must both be tokens of the same image-tag record.
fn push_tag(builder: &mut QueryBuilder<'static, Postgres>, tag: &NormalizedTag) {
	builder.push(
		"EXISTS (SELECT 1 FROM imagen2d i WHERE i.propiedad_id = p.id \
		 AND regexp_split_to_array(lower(normalize(i.tags_visuales, NFC)), '",
	);
	builder.push(TAG_SEPARATOR_PATTERN);
	builder.push("') @> ARRAY[");
	builder.push_bind(tag.space.clone());
	builder.push(", ");
	builder.push_bind(tag.descriptor.clone());
	builder.push("]::text[])");
}

fn like_pattern(value: &str) -> String {
	let escaped = value.trim().replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");

	format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
	use hogar_domain::{
		filter::{FilterState, OperationType},
		query,
	};

	use super::*;

	fn ready_state() -> FilterState {
		FilterState {
			property_type: Some("casa".to_string()),
			locality: Some("Villa María".to_string()),
			..Default::default()
		}
	}

	#[test]
	fn renders_required_predicates_with_bound_parameters() {
		let state = FilterState {
			operation_type: Some(OperationType::Sale),
			price_max: Some(250_000.0),
			..ready_state()
		};
		let builder = build_search(&query::compile(&state), true).expect("build failed");
		let sql = builder.sql();

		assert!(sql.contains("p.\"tipoOperacion\" = ANY($1)"));
		assert!(sql.contains("tp.nombre ILIKE $2"));
		assert!(sql.contains("l.nombre ILIKE $3"));
		assert!(sql.contains("p.precio <= $4"));
		assert!(sql.contains("NULL::float8 AS relevance"));
		assert!(sql.contains("AND EXISTS (SELECT 1 FROM imagen2d i WHERE i.propiedad_id = p.id)"));
		assert!(sql.ends_with("ORDER BY p.precio ASC, p.id ASC LIMIT $5"));
		assert!(!sql.contains("Villa"));
	}

	#[test]
	fn excluded_tags_render_as_negated_group() {
		let state = FilterState { excluded_tags: vec!["garage pequeño".to_string()], ..ready_state() };
		let builder = build_search(&query::compile(&state), false).expect("build failed");
		let sql = builder.sql();

		assert!(sql.contains("NOT (EXISTS (SELECT 1 FROM imagen2d i"));
		assert!(sql.contains("@> ARRAY[$4, $5]::text[])"));
		assert!(!sql.contains("AND EXISTS (SELECT 1 FROM imagen2d i WHERE i.propiedad_id = p.id)"));
	}

	#[test]
	fn rank_term_binds_before_filters_and_orders_first() {
		let state = FilterState { free_text_query: Some("pileta, quincho".to_string()), ..ready_state() };
		let builder = build_search(&query::compile(&state), true).expect("build failed");
		let sql = builder.sql();

		assert!(sql.contains(
			"plainto_tsquery('spanish', $1) || plainto_tsquery('spanish', $2))::float8 AS relevance"
		));
		assert!(sql.contains("(p.descripcion ILIKE $6 OR p.descripcion ILIKE $7)"));
		assert!(sql.contains("ORDER BY relevance DESC, p.precio ASC, p.id ASC"));
	}

	#[test]
	fn like_patterns_escape_wildcards() {
		assert_eq!(like_pattern(" 100%_casa "), "%100\\%\\_casa%");
	}
}
