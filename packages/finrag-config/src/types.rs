use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub models: Models,
	pub rate_limit: RateLimit,
	pub storage: Storage,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub planner: Planner,
	#[serde(default)]
	pub report: Report,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub completion: CompletionProviderConfig,
	pub knowledge_index: IndexProviderConfig,
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Deserialize)]
pub struct CompletionProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct IndexProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Optional. Index servers running on localhost usually do not require a key.
	pub api_key: Option<String>,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Models {
	pub router: ModelConfig,
	pub planner: ModelConfig,
	pub synthesizer: ModelConfig,
	pub report: ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct RateLimit {
	/// Ceiling of completion calls admitted in any trailing window.
	pub max_calls: u32,
	pub period_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub index_root: String,
	pub report_root: String,
	#[serde(default = "default_report_extension")]
	pub report_extension: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub mode: String,
	pub top_k: u32,
	pub min_chunk_chars: u32,
	pub max_contexts: u32,
	pub min_context_chars: u32,
	pub call_timeout_ms: u64,
	pub question_concurrency: u32,
	pub question_timeout_ms: u64,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			mode: "hybrid".to_string(),
			top_k: 100,
			min_chunk_chars: 200,
			max_contexts: 30,
			min_context_chars: 100,
			call_timeout_ms: 120_000,
			question_concurrency: 5,
			question_timeout_ms: 600_000,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Planner {
	pub max_queries: u32,
	pub min_query_chars: u32,
	pub cache_enabled: bool,
	pub cache_ttl_secs: u64,
}
impl Default for Planner {
	fn default() -> Self {
		Self { max_queries: 5, min_query_chars: 5, cache_enabled: false, cache_ttl_secs: 86_400 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Report {
	/// Raw contexts attached to each evidence entry.
	pub excerpt_contexts: u32,
	pub excerpt_chars: u32,
}
impl Default for Report {
	fn default() -> Self {
		Self { excerpt_contexts: 2, excerpt_chars: 800 }
	}
}

fn default_report_extension() -> String {
	"md".to_string()
}
