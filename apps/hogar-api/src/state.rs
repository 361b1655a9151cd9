use std::sync::Arc;

use hogar_service::HogarService;
use hogar_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<HogarService>,
}
impl AppState {
	pub async fn new(config: hogar_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(HogarService::new(config, db)))
	}

	pub fn from_service(service: HogarService) -> Self {
		Self { service: Arc::new(service) }
	}
}
