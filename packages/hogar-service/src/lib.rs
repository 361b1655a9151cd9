pub mod chat;
pub mod extract;
pub mod session;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

pub use chat::{ChatRequest, ChatResponse, DEGRADED_CATALOG, DEGRADED_EXTRACTION};
pub use error::{Error, Result};
pub use extract::ExtractionFailure;
pub use session::{SessionRecord, SessionStore, Turn, TurnRole};

use hogar_config::{Config, LlmProviderConfig};
use hogar_domain::{listing::PropertyRecord, query::QueryPlan};
use hogar_providers::extractor;
use hogar_storage::{catalog, db::Db};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait ExtractorProvider
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<Value>>;
}

/// Executes a compiled plan. Returns matching records; ordering is re-applied by the caller.
pub trait CatalogProvider
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, plan: &'a QueryPlan) -> BoxFuture<'a, Result<Vec<PropertyRecord>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub extractor: Arc<dyn ExtractorProvider>,
	pub catalog: Arc<dyn CatalogProvider>,
}
impl Providers {
	pub fn new(extractor: Arc<dyn ExtractorProvider>, catalog: Arc<dyn CatalogProvider>) -> Self {
		Self { extractor, catalog }
	}
}

pub struct PgCatalog {
	db: Db,
	require_images: bool,
}
impl PgCatalog {
	pub fn new(db: Db, require_images: bool) -> Self {
		Self { db, require_images }
	}
}
impl CatalogProvider for PgCatalog {
	fn search<'a>(&'a self, plan: &'a QueryPlan) -> BoxFuture<'a, Result<Vec<PropertyRecord>>> {
		Box::pin(async move { Ok(catalog::search(&self.db, plan, self.require_images).await?) })
	}
}

pub struct HogarService {
	pub cfg: Config,
	pub providers: Providers,
	pub sessions: SessionStore,
}
impl HogarService {
	pub fn new(cfg: Config, db: Db) -> Self {
		let catalog = Arc::new(PgCatalog::new(db, cfg.catalog.require_images));
		let providers = Providers::new(Arc::new(DefaultProviders), catalog);

		Self::with_providers(cfg, providers)
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers, sessions: SessionStore::new() }
	}
}

struct DefaultProviders;
impl ExtractorProvider for DefaultProviders {
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<Value>> {
		Box::pin(async move { Ok(extractor::extract(cfg, messages).await?) })
	}
}
