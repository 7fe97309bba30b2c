mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CompletionProviderConfig, Config, IndexProviderConfig, ModelConfig, Models, Planner,
	Providers, RateLimit, Report, Retrieval, Service, Storage,
};

use std::{fs, path::Path};

/// Reads the service TOML at `path`, trims its free-form fields and rejects unusable settings.
pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
	let mut cfg = toml::from_str::<Config>(&raw)
		.map_err(|source| Error::Parse { path: path.to_path_buf(), source })?;

	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(invalid("service.log_level", "must be non-empty."));
	}
	if cfg.providers.completion.api_key.trim().is_empty() {
		return Err(invalid("providers.completion.api_key", "must be non-empty."));
	}

	for (label, base, timeout_ms) in [
		(
			"providers.completion",
			&cfg.providers.completion.api_base,
			cfg.providers.completion.timeout_ms,
		),
		(
			"providers.knowledge_index",
			&cfg.providers.knowledge_index.api_base,
			cfg.providers.knowledge_index.timeout_ms,
		),
	] {
		if base.trim().is_empty() {
			return Err(invalid(format!("{label}.api_base"), "must be non-empty."));
		}
		if timeout_ms == 0 {
			return Err(invalid(format!("{label}.timeout_ms"), "must be greater than zero."));
		}
	}

	for (label, model) in [
		("models.router", &cfg.models.router),
		("models.planner", &cfg.models.planner),
		("models.synthesizer", &cfg.models.synthesizer),
		("models.report", &cfg.models.report),
	] {
		if model.model.trim().is_empty() {
			return Err(invalid(format!("{label}.model"), "must be non-empty."));
		}
		if !model.temperature.is_finite() {
			return Err(invalid(format!("{label}.temperature"), "must be a finite number."));
		}
		if !(0.0..=2.0).contains(&model.temperature) {
			return Err(invalid(format!("{label}.temperature"), "must be in the range 0.0-2.0."));
		}
		if model.max_tokens == 0 {
			return Err(invalid(format!("{label}.max_tokens"), "must be greater than zero."));
		}
	}

	if cfg.rate_limit.max_calls == 0 {
		return Err(invalid("rate_limit.max_calls", "must be greater than zero."));
	}
	if cfg.rate_limit.period_ms == 0 {
		return Err(invalid("rate_limit.period_ms", "must be greater than zero."));
	}
	if cfg.storage.index_root.trim().is_empty() {
		return Err(invalid("storage.index_root", "must be non-empty."));
	}
	if cfg.storage.report_root.trim().is_empty() {
		return Err(invalid("storage.report_root", "must be non-empty."));
	}

	let ext = cfg.storage.report_extension.as_str();

	if ext.is_empty() || ext.contains(['/', '\\', '.']) {
		return Err(invalid(
			"storage.report_extension",
			"must be a bare, non-empty file extension.",
		));
	}
	if !matches!(cfg.retrieval.mode.as_str(), "local" | "global" | "hybrid" | "naive" | "mix") {
		return Err(invalid(
			"retrieval.mode",
			"must be one of local, global, hybrid, naive, or mix.",
		));
	}

	for (label, value) in [
		("retrieval.top_k", u64::from(cfg.retrieval.top_k)),
		("retrieval.max_contexts", u64::from(cfg.retrieval.max_contexts)),
		("retrieval.call_timeout_ms", cfg.retrieval.call_timeout_ms),
		("retrieval.question_concurrency", u64::from(cfg.retrieval.question_concurrency)),
		("retrieval.question_timeout_ms", cfg.retrieval.question_timeout_ms),
		("report.excerpt_contexts", u64::from(cfg.report.excerpt_contexts)),
		("report.excerpt_chars", u64::from(cfg.report.excerpt_chars)),
	] {
		if value == 0 {
			return Err(invalid(label, "must be greater than zero."));
		}
	}

	if !(1..=10).contains(&cfg.planner.max_queries) {
		return Err(invalid("planner.max_queries", "must be in the range 1-10."));
	}
	if cfg.planner.cache_enabled && cfg.planner.cache_ttl_secs == 0 {
		return Err(invalid(
			"planner.cache_ttl_secs",
			"must be greater than zero when the cache is enabled.",
		));
	}

	Ok(())
}

fn invalid(key: impl Into<String>, reason: &str) -> Error {
	Error::Invalid { key: key.into(), reason: reason.to_string() }
}

fn normalize(cfg: &mut Config) {
	if cfg
		.providers
		.knowledge_index
		.api_key
		.as_deref()
		.map(|key| key.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.knowledge_index.api_key = None;
	}

	let ext = cfg.storage.report_extension.trim().trim_start_matches('.').to_string();

	cfg.storage.report_extension = ext;
	cfg.retrieval.mode = cfg.retrieval.mode.trim().to_lowercase();
}
