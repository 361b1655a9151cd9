use hogar_domain::{filter::OperationType, listing::PropertyRecord};

pub const SALE_CODE: &str = "VENTA";
pub const RENT_CODE: &str = "ALQUILER";

#[derive(Debug, sqlx::FromRow)]
pub struct PropertyRow {
	pub id: i64,
	pub name: String,
	pub description: String,
	pub address: String,
	pub price: f64,
	pub area: i32,
	pub bedrooms: i32,
	pub bathrooms: i32,
	pub rooms: i32,
	pub operation_code: String,
	pub locality: Option<String>,
	pub property_type: Option<String>,
	pub architectural_style: Option<String>,
	pub view_types: Vec<String>,
	pub tags: Vec<String>,
	pub relevance: Option<f64>,
}
impl From<PropertyRow> for PropertyRecord {
	fn from(row: PropertyRow) -> Self {
		Self {
			id: row.id,
			name: row.name,
			description: row.description,
			address: row.address,
			price: row.price,
			area: row.area,
			bedrooms: row.bedrooms,
			bathrooms: row.bathrooms,
			rooms: row.rooms,
			operation_type: operation_from_code(&row.operation_code),
			locality: row.locality,
			property_type: row.property_type,
			architectural_style: row.architectural_style,
			view_types: row.view_types,
			tags: row.tags,
			rank: row.relevance,
		}
	}
}

pub fn operation_code(operation: OperationType) -> &'static str {
	match operation {
		OperationType::Sale => SALE_CODE,
		OperationType::Rent => RENT_CODE,
	}
}

pub fn operation_from_code(code: &str) -> Option<OperationType> {
	match code.trim() {
		SALE_CODE => Some(OperationType::Sale),
		RENT_CODE => Some(OperationType::Rent),
		_ => None,
	}
}
