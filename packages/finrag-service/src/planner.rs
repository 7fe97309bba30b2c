use std::collections::HashSet;

use crate::{Error, FinragService, Result};
use finrag_domain::{
	catalog::Industry,
	grounding,
	period::ReportRequest,
	statement::{self, StatementHints},
};
use finrag_providers::CompletionRequest;

const PLANNER_SYSTEM_PROMPT: &str = "You write search queries for a retrieval index built from \
Vietnamese quarterly financial statements and their notes. Reply with one query per line and \
nothing else.";

const BANK_INSTRUCTIONS: &str = "The company is a bank. Use banking statement wording: \
\"Thu nhập lãi thuần\", \"Cho vay khách hàng\", \"Tiền gửi của khách hàng\", \
\"Chi phí dự phòng rủi ro tín dụng\", \"Nợ xấu\", \"Lãi thuần từ hoạt động dịch vụ\". \
Never use manufacturing terms such as \"Doanh thu bán hàng\" or \"Giá vốn hàng bán\".";
const REAL_ESTATE_INSTRUCTIONS: &str = "The company is a real-estate developer. Anchor queries on \
\"Hàng tồn kho\", \"Chi phí sản xuất kinh doanh dở dang\", \"Người mua trả tiền trước\", \
\"Vay và nợ thuê tài chính\" and project names where the question implies them.";
const GENERAL_INSTRUCTIONS: &str = "Use standard VAS statement wording: \
\"Doanh thu thuần về bán hàng và cung cấp dịch vụ\", \"Giá vốn hàng bán\", \"Lợi nhuận gộp\", \
\"Chi phí bán hàng\", \"Chi phí quản lý doanh nghiệp\".";
const STATEMENT_ANCHORS: &str = "Statement anchors:\n\
- Cash flow: \"Lưu chuyển tiền thuần từ hoạt động kinh doanh\", \"Khấu hao tài sản cố định\", \
\"Tiền chi mua sắm, xây dựng tài sản cố định\".\n\
- Income: \"Lợi nhuận sau thuế thu nhập doanh nghiệp\", \"Tổng lợi nhuận kế toán trước thuế\".\n\
- Balance sheet: \"Tổng tài sản\", \"Vốn chủ sở hữu\", \"Nợ phải trả\".";

impl FinragService {
	/// Rewrites `question` into index queries for `request`'s period.
	///
	/// Never fails: backend errors or unusable output yield [`fallback_queries`].
	pub async fn plan_queries(&self, question: &str, request: &ReportRequest) -> Vec<String> {
		let planner_cfg = &self.cfg.planner;
		let model_cfg = &self.cfg.models.planner;
		let cache_key = if planner_cfg.cache_enabled {
			match build_expansion_cache_key(
				question,
				request,
				&model_cfg.model,
				model_cfg.temperature,
			) {
				Ok(key) => Some(key),
				Err(err) => {
					tracing::warn!(error = %err, "Cache key build failed.");

					None
				},
			}
		} else {
			None
		};

		if let Some(key) = cache_key.as_ref() {
			if let Some(queries) = self.expansion_cache.get(key) {
				tracing::info!(cache_key_prefix = cache_key_prefix(key), hit = true, "Cache hit.");

				return queries;
			}

			tracing::info!(cache_key_prefix = cache_key_prefix(key), hit = false, "Cache miss.");
		}

		let industry = Industry::classify(request.ticker());
		let hints = statement::statement_hints(question);
		let prompt = build_planner_prompt(
			question,
			request,
			industry,
			&hints,
			planner_cfg.max_queries as usize,
		);
		let completion =
			CompletionRequest::new(model_cfg, Some(PLANNER_SYSTEM_PROMPT.to_string()), prompt);
		let raw = match self.complete("plan", completion).await {
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(error = %err, "Query planning failed; using templated queries.");

				return fallback_queries(question, request);
			},
		};
		let queries = normalize_queries(
			&raw,
			question,
			planner_cfg.min_query_chars as usize,
			planner_cfg.max_queries as usize,
		);

		if queries.is_empty() {
			tracing::warn!("Query planner returned no usable lines; using templated queries.");

			return fallback_queries(question, request);
		}
		if let Some(key) = cache_key {
			self.expansion_cache.insert(key, queries.clone());
		}

		queries
	}
}

/// The two deterministic queries used when planning yields nothing.
pub fn fallback_queries(question: &str, request: &ReportRequest) -> Vec<String> {
	let year = request.year();

	vec![
		format!("{} {year}", question.trim()),
		format!("Báo cáo tài chính {} {year}", request.ticker()),
	]
}

pub(crate) fn build_planner_prompt(
	question: &str,
	request: &ReportRequest,
	industry: Industry,
	hints: &StatementHints,
	max_queries: usize,
) -> String {
	let industry_instructions = match industry {
		Industry::Bank => BANK_INSTRUCTIONS,
		Industry::RealEstate => REAL_ESTATE_INSTRUCTIONS,
		Industry::General => GENERAL_INSTRUCTIONS,
	};
	let mut prompt = format!(
		"Company: {ticker}\nPeriod: {period}\nIndustry: {industry}\n\n\
		{industry_instructions}\n\n{STATEMENT_ANCHORS}\n",
		ticker = request.ticker(),
		period = request.period(),
	);

	if let Some(kind) = hints.statement {
		prompt.push_str(&format!("\nThe question most likely targets the {}.", kind.title()));
	}
	if !hints.codes.is_empty() {
		prompt.push_str(&format!("\nLine items to anchor on: {}.", hints.codes.join("; ")));
	}

	prompt.push_str(&format!(
		"\n\nWrite up to {max_queries} short Vietnamese search queries that would retrieve the \
		figures needed to answer the question below. Use the exact statement wording, include the \
		ticker and the period in each query, and do not repeat the question verbatim.\n\n\
		Question: \"{question}\""
	));

	prompt
}

/// One query per usable output line: list markers stripped, short lines and duplicates dropped.
pub(crate) fn normalize_queries(
	raw: &str,
	question: &str,
	min_chars: usize,
	max_queries: usize,
) -> Vec<String> {
	let cleaned = grounding::remove_thinking(raw);
	let mut seen = HashSet::from([question.trim().to_lowercase()]);
	let mut out = Vec::new();

	for line in cleaned.lines() {
		if out.len() >= max_queries {
			break;
		}

		let query = strip_list_marker(line.trim()).trim_matches(['"', '“', '”']);
		let query = query.trim();

		if query.chars().count() < min_chars {
			continue;
		}
		if seen.insert(query.to_lowercase()) {
			out.push(query.to_string());
		}
	}

	out
}

/// Drops a leading run of digits and `-.)*•` when it is followed by whitespace.
fn strip_list_marker(line: &str) -> &str {
	let rest = line.trim_start_matches(|c: char| c.is_ascii_digit() || "-.)*•".contains(c));

	if rest.len() < line.len() && rest.starts_with(char::is_whitespace) {
		rest.trim_start()
	} else {
		line
	}
}

fn build_expansion_cache_key(
	question: &str,
	request: &ReportRequest,
	model: &str,
	temperature: f32,
) -> Result<String> {
	let payload = serde_json::json!({
		"kind": "expansion",
		"question": question.trim(),
		"ticker": request.ticker(),
		"year": request.year(),
		"quarter": request.quarter().as_str(),
		"model": model,
		"temperature": temperature,
	});
	let raw = serde_json::to_vec(&payload).map_err(|err| Error::InvalidRequest {
		message: format!("Failed to encode cache key payload: {err}"),
	})?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}

fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}
