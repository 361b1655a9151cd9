use serde::{Deserialize, Serialize};

use crate::filter::OperationType;

/// One catalog listing as returned to the chat surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
	pub id: i64,
	pub name: String,
	pub description: String,
	pub address: String,
	pub price: f64,
	pub area: i32,
	pub bedrooms: i32,
	pub bathrooms: i32,
	pub rooms: i32,
	pub operation_type: Option<OperationType>,
	pub locality: Option<String>,
	pub property_type: Option<String>,
	pub architectural_style: Option<String>,
	#[serde(default)]
	pub view_types: Vec<String>,
	/// Raw image-tag records, one per image (e.g. "garage, pequeño, techado").
	#[serde(default)]
	pub tags: Vec<String>,
	/// Relevance against the free-text term; only set when the query carried one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rank: Option<f64>,
}
