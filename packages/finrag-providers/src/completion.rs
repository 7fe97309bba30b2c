use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use finrag_config::{CompletionProviderConfig, ModelConfig};

#[derive(Debug, Clone)]
pub struct CompletionRequest {
	pub system: Option<String>,
	pub user: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
}
impl CompletionRequest {
	pub fn new(model: &ModelConfig, system: Option<String>, user: String) -> Self {
		Self {
			system,
			user,
			model: model.model.clone(),
			temperature: model.temperature,
			max_tokens: model.max_tokens,
		}
	}
}

pub async fn complete(cfg: &CompletionProviderConfig, request: &CompletionRequest) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = build_body(request);
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_response(json)
}

fn build_body(request: &CompletionRequest) -> Value {
	let mut messages = Vec::with_capacity(2);

	if let Some(system) = request.system.as_deref() {
		messages.push(serde_json::json!({ "role": "system", "content": system }));
	}

	messages.push(serde_json::json!({ "role": "user", "content": request.user }));

	serde_json::json!({
		"model": request.model,
		"temperature": request.temperature,
		"max_tokens": request.max_tokens,
		"messages": messages,
		"stream": false,
	})
}

fn parse_completion_response(json: Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| eyre::eyre!("Completion response is missing message content."))?;

	Ok(content.trim().to_string())
}
