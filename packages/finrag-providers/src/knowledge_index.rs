use std::{path::PathBuf, time::Duration};

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use finrag_config::IndexProviderConfig;

#[derive(Debug, Clone)]
pub struct IndexQuery {
	pub query: String,
	pub mode: String,
	pub top_k: u32,
	/// Storage root of the per-period index the query targets.
	pub working_dir: PathBuf,
}

/// Decoded index reply. Every accepted wire shape collapses into one of these two.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexResponse {
	Text(String),
	Chunks(Vec<RankedChunk>),
}
impl IndexResponse {
	/// Flattens the reply into one context string, keeping the backend's rank order.
	pub fn into_text(self) -> String {
		match self {
			Self::Text(text) => text,
			Self::Chunks(chunks) => chunks
				.into_iter()
				.map(|chunk| chunk.content)
				.filter(|content| !content.trim().is_empty())
				.collect::<Vec<_>>()
				.join("\n\n"),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedChunk {
	pub content: String,
	pub score: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireResponse {
	Text(String),
	Answer { response: String },
	ChunkList { chunks: Vec<WireChunk> },
	List(Vec<WireChunk>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireChunk {
	Object {
		content: String,
		#[serde(default)]
		score: Option<f32>,
	},
	Text(String),
	Pair(String, f32),
}
impl From<WireChunk> for RankedChunk {
	fn from(chunk: WireChunk) -> Self {
		match chunk {
			WireChunk::Object { content, score } => Self { content, score },
			WireChunk::Text(content) => Self { content, score: None },
			WireChunk::Pair(content, score) => Self { content, score: Some(score) },
		}
	}
}

pub async fn query(cfg: &IndexProviderConfig, request: &IndexQuery) -> Result<IndexResponse> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"query": request.query,
		"mode": request.mode,
		"top_k": request.top_k,
		"working_dir": request.working_dir.to_string_lossy(),
	});
	let api_key = cfg.api_key.as_deref().unwrap_or_default();
	let res = client
		.post(url)
		.headers(crate::auth_headers(api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_index_response(json)
}

pub fn parse_index_response(json: Value) -> Result<IndexResponse> {
	let wire: WireResponse = serde_json::from_value(json)
		.map_err(|err| eyre::eyre!("Index response has an unsupported shape: {err}"))?;
	let response = match wire {
		WireResponse::Text(text) | WireResponse::Answer { response: text } => {
			IndexResponse::Text(text)
		},
		WireResponse::ChunkList { chunks } | WireResponse::List(chunks) => {
			IndexResponse::Chunks(chunks.into_iter().map(RankedChunk::from).collect())
		},
	};

	Ok(response)
}
