mod error;

pub use error::{Error, Result};

use std::{
	env, fs,
	path::{Path, PathBuf},
	process,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::{Duration, SystemTime, UNIX_EPOCH},
};

use tokio::time;

use finrag_config::{CompletionProviderConfig, Config, IndexProviderConfig};
use finrag_domain::period::ReportRequest;
use finrag_providers::{CompletionRequest, IndexQuery, IndexResponse};
use finrag_service::{BoxFuture, CompletionProvider, KnowledgeIndexProvider, Providers};

pub const ROUTER_MODEL: &str = "router-model";
pub const PLANNER_MODEL: &str = "planner-model";
pub const SYNTHESIZER_MODEL: &str = "synthesizer-model";
pub const REPORT_MODEL: &str = "report-model";

static WORKSPACE_COUNTER: AtomicUsize = AtomicUsize::new(0);

type CompletionScript =
	dyn Fn(&CompletionRequest) -> color_eyre::Result<String> + Send + Sync + 'static;
type IndexScript = dyn Fn(&IndexQuery) -> color_eyre::Result<IndexResponse> + Send + Sync + 'static;
type CompletionDelay = dyn Fn(&CompletionRequest) -> Duration + Send + Sync + 'static;
type IndexDelay = dyn Fn(&IndexQuery) -> Duration + Send + Sync + 'static;

/// Scratch directory holding index and report roots plus a loadable config.
pub struct TestWorkspace {
	root: PathBuf,
	cleaned: bool,
}
impl TestWorkspace {
	pub fn new(label: &str) -> Result<Self> {
		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_err(|err| Error::Message(format!("System clock before epoch: {err}.")))?
			.as_nanos();
		let counter = WORKSPACE_COUNTER.fetch_add(1, Ordering::Relaxed);
		let root = env::temp_dir()
			.join(format!("finrag_test_{label}_{}_{nanos}_{counter}", process::id()));

		fs::create_dir_all(root.join("rag_storage"))?;
		fs::create_dir_all(root.join("reports"))?;

		Ok(Self { root, cleaned: false })
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn index_root(&self) -> PathBuf {
		self.root.join("rag_storage")
	}

	pub fn report_root(&self) -> PathBuf {
		self.root.join("reports")
	}

	/// Creates the on-disk root of `request`'s knowledge index.
	pub fn create_index(&self, request: &ReportRequest) -> Result<PathBuf> {
		let path = self
			.index_root()
			.join(request.ticker())
			.join(request.year().to_string())
			.join(request.quarter().as_str());

		fs::create_dir_all(&path)?;

		Ok(path)
	}

	/// Writes a config pointing at this workspace and loads it through `finrag_config::load`.
	///
	/// `overrides` is appended verbatim, so it may add tables the base omits.
	pub fn config(&self, overrides: &str) -> Result<Config> {
		let path = self.root.join("finrag.toml");
		let raw = format!(
			"{base}\n{overrides}",
			base = base_config(&self.index_root(), &self.report_root())
		);

		fs::write(&path, raw)?;

		Ok(finrag_config::load(&path)?)
	}

	pub fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner()
	}

	fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		fs::remove_dir_all(&self.root)?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestWorkspace {
	fn drop(&mut self) {
		if let Err(err) = self.cleanup_inner() {
			eprintln!("Test workspace cleanup failed: {err}.");
		}
	}
}

/// Completion backend driven by a closure, with call and concurrency accounting.
pub struct ScriptedCompletion {
	script: Box<CompletionScript>,
	delay: Box<CompletionDelay>,
	calls: AtomicUsize,
	active: AtomicUsize,
	max_active: AtomicUsize,
	requests: Mutex<Vec<CompletionRequest>>,
}
impl ScriptedCompletion {
	pub fn new<F>(script: F) -> Self
	where
		F: Fn(&CompletionRequest) -> color_eyre::Result<String> + Send + Sync + 'static,
	{
		Self {
			script: Box::new(script),
			delay: Box::new(|_| Duration::ZERO),
			calls: AtomicUsize::new(0),
			active: AtomicUsize::new(0),
			max_active: AtomicUsize::new(0),
			requests: Mutex::new(Vec::new()),
		}
	}

	pub fn replying(text: &str) -> Self {
		let text = text.to_string();

		Self::new(move |_| Ok(text.clone()))
	}

	pub fn failing() -> Self {
		Self::new(|_| Err(color_eyre::eyre::eyre!("Completion backend unavailable.")))
	}

	/// Each call sleeps for `delay` before answering.
	pub fn with_delay(self, delay: Duration) -> Self {
		self.with_delay_by(move |_| delay)
	}

	/// Each call sleeps for whatever `delay` returns for its request.
	pub fn with_delay_by<F>(mut self, delay: F) -> Self
	where
		F: Fn(&CompletionRequest) -> Duration + Send + Sync + 'static,
	{
		self.delay = Box::new(delay);

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Highest number of calls observed in flight at once.
	pub fn max_active(&self) -> usize {
		self.max_active.load(Ordering::SeqCst)
	}

	pub fn requests(&self) -> Vec<CompletionRequest> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn calls_for(&self, model: &str) -> usize {
		self.requests
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.filter(|request| request.model == model)
			.count()
	}
}
impl CompletionProvider for ScriptedCompletion {
	fn complete<'a>(
		&'a self,
		_cfg: &'a CompletionProviderConfig,
		request: &'a CompletionRequest,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.requests.lock().unwrap_or_else(|err| err.into_inner()).push(request.clone());

			let _active = ActiveGuard::enter(&self.active, &self.max_active);
			let delay = (self.delay)(request);

			if !delay.is_zero() {
				time::sleep(delay).await;
			}

			(self.script)(request)
		})
	}
}

/// Knowledge index backend driven by a closure.
pub struct StaticIndex {
	script: Box<IndexScript>,
	delay: Box<IndexDelay>,
	calls: AtomicUsize,
	queries: Mutex<Vec<IndexQuery>>,
}
impl StaticIndex {
	pub fn new<F>(script: F) -> Self
	where
		F: Fn(&IndexQuery) -> color_eyre::Result<IndexResponse> + Send + Sync + 'static,
	{
		Self {
			script: Box::new(script),
			delay: Box::new(|_| Duration::ZERO),
			calls: AtomicUsize::new(0),
			queries: Mutex::new(Vec::new()),
		}
	}

	/// Answers every query with `text`.
	pub fn with_text(text: &str) -> Self {
		let text = text.to_string();

		Self::new(move |_| Ok(IndexResponse::Text(text.clone())))
	}

	/// Each query sleeps for whatever `delay` returns for it before answering.
	pub fn with_delay_by<F>(mut self, delay: F) -> Self
	where
		F: Fn(&IndexQuery) -> Duration + Send + Sync + 'static,
	{
		self.delay = Box::new(delay);

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn queries(&self) -> Vec<IndexQuery> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl KnowledgeIndexProvider for StaticIndex {
	fn query<'a>(
		&'a self,
		_cfg: &'a IndexProviderConfig,
		request: &'a IndexQuery,
	) -> BoxFuture<'a, color_eyre::Result<IndexResponse>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.queries.lock().unwrap_or_else(|err| err.into_inner()).push(request.clone());

			let delay = (self.delay)(request);

			if !delay.is_zero() {
				time::sleep(delay).await;
			}

			(self.script)(request)
		})
	}
}

pub fn providers(completion: &Arc<ScriptedCompletion>, index: &Arc<StaticIndex>) -> Providers {
	Providers::new(completion.clone(), index.clone())
}

struct ActiveGuard<'a> {
	active: &'a AtomicUsize,
}
impl<'a> ActiveGuard<'a> {
	fn enter(active: &'a AtomicUsize, max_active: &AtomicUsize) -> Self {
		let now = active.fetch_add(1, Ordering::SeqCst) + 1;

		max_active.fetch_max(now, Ordering::SeqCst);

		Self { active }
	}
}
impl Drop for ActiveGuard<'_> {
	fn drop(&mut self) {
		self.active.fetch_sub(1, Ordering::SeqCst);
	}
}

fn base_config(index_root: &Path, report_root: &Path) -> String {
	format!(
		r#"[service]
log_level = "debug"

[providers.completion]
provider_id = "scripted"
api_base    = "http://127.0.0.1:1/v1"
api_key     = "test-key"
path        = "/chat/completions"
timeout_ms  = 300000

[providers.knowledge_index]
provider_id = "static"
api_base    = "http://127.0.0.1:1"
path        = "/query"
timeout_ms  = 120000

[models.router]
model       = "{ROUTER_MODEL}"
temperature = 0.0
max_tokens  = 50

[models.planner]
model       = "{PLANNER_MODEL}"
temperature = 0.1
max_tokens  = 1024

[models.synthesizer]
model       = "{SYNTHESIZER_MODEL}"
temperature = 0.1
max_tokens  = 8192

[models.report]
model       = "{REPORT_MODEL}"
temperature = 0.3
max_tokens  = 8192

[rate_limit]
max_calls = 1000
period_ms = 60000

[storage]
index_root  = {index_root:?}
report_root = {report_root:?}
"#,
		index_root = index_root.display().to_string(),
		report_root = report_root.display().to_string(),
	)
}
