pub mod cache;
pub mod error;
pub mod gather;
pub mod index;
pub mod planner;
pub mod rate_limit;
pub mod report;
pub mod report_store;
pub mod retrieval;
pub mod router;
pub mod synthesis;

pub use cache::{CacheEntry, TtlCache};
pub use error::{Error, Result};
pub use index::{IndexResolver, KnowledgeIndexHandle, ResolvedIndex};
pub use rate_limit::RateLimiter;
pub use report::{ReportOutcome, ReportSource};
pub use report_store::ReportStore;
pub use retrieval::QueryOutcome;
pub use router::{Route, RouteSource};
pub use synthesis::Answer;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use tokio::time;
use tracing_subscriber::EnvFilter;

use finrag_config::{CompletionProviderConfig, Config, IndexProviderConfig};
use finrag_providers::{
	CompletionRequest, IndexQuery, IndexResponse, completion, knowledge_index,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait KnowledgeIndexProvider
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		cfg: &'a IndexProviderConfig,
		request: &'a IndexQuery,
	) -> BoxFuture<'a, color_eyre::Result<IndexResponse>>;
}

#[derive(Clone)]
pub struct Providers {
	pub completion: Arc<dyn CompletionProvider>,
	pub index: Arc<dyn KnowledgeIndexProvider>,
}
impl Providers {
	pub fn new(
		completion: Arc<dyn CompletionProvider>,
		index: Arc<dyn KnowledgeIndexProvider>,
	) -> Self {
		Self { completion, index }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { completion: provider.clone(), index: provider }
	}
}

pub struct FinragService {
	pub cfg: Config,
	pub providers: Providers,
	pub limiter: Arc<RateLimiter>,
	pub resolver: IndexResolver,
	pub reports: ReportStore,
	expansion_cache: TtlCache<String, Vec<String>>,
}
impl FinragService {
	/// `limiter` is shared with every other component that calls the completion backend.
	pub fn new(cfg: Config, limiter: Arc<RateLimiter>) -> Self {
		Self::with_providers(cfg, limiter, Providers::default())
	}

	pub fn with_providers(cfg: Config, limiter: Arc<RateLimiter>, providers: Providers) -> Self {
		let resolver = IndexResolver::new(&cfg.storage.index_root);
		let reports = ReportStore::new(&cfg.storage.report_root, &cfg.storage.report_extension);
		let expansion_cache = TtlCache::new(Duration::from_secs(cfg.planner.cache_ttl_secs));

		Self { cfg, providers, limiter, resolver, reports, expansion_cache }
	}

	/// One rate-limited completion call under the configured hard timeout.
	pub(crate) async fn complete(
		&self,
		operation: &'static str,
		request: CompletionRequest,
	) -> Result<String> {
		self.limiter.acquire().await;

		let provider_cfg = &self.cfg.providers.completion;
		let timeout_ms = provider_cfg.timeout_ms;
		let call = self.providers.completion.complete(provider_cfg, &request);

		match time::timeout(Duration::from_millis(timeout_ms), call).await {
			Ok(Ok(text)) => Ok(text),
			Ok(Err(err)) => Err(err.into()),
			Err(_) => Err(Error::Timeout { operation, timeout_ms }),
		}
	}
}

struct DefaultProviders;
impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(completion::complete(cfg, request))
	}
}
impl KnowledgeIndexProvider for DefaultProviders {
	fn query<'a>(
		&'a self,
		cfg: &'a IndexProviderConfig,
		request: &'a IndexQuery,
	) -> BoxFuture<'a, color_eyre::Result<IndexResponse>> {
		Box::pin(knowledge_index::query(cfg, request))
	}
}

pub fn init_tracing(cfg: &Config) {
	let filter =
		EnvFilter::try_new(&cfg.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	// A host that already installed a subscriber keeps it.
	let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
