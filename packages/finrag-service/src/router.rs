use time::{Date, OffsetDateTime};

use crate::FinragService;
use finrag_domain::{
	catalog,
	grounding,
	period::{DEFAULT_TICKER, Quarter, ReportRequest},
};
use finrag_providers::CompletionRequest;

const ROUTER_SYSTEM_PROMPT: &str = "You route questions about Vietnamese listed companies to a \
stock ticker and a reporting period. Reply with exactly one line in the form TICKER|YEAR|QUARTER, \
for example SSB|2025|Q3. Do not add any other text.";

const MIN_YEAR: i32 = 1990;
const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
	/// The router model's ticker was accepted as-is.
	Model,
	/// The model named an unknown ticker and the catalog match replaced it.
	CatalogOverride,
	/// The default ticker or the full sentinel was used.
	Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
	pub request: ReportRequest,
	pub source: RouteSource,
}

impl FinragService {
	/// Routes `question` against the current UTC date.
	pub async fn route(&self, question: &str) -> Route {
		self.route_at(question, OffsetDateTime::now_utc().date()).await
	}

	/// Never fails: malformed or missing model output yields the sentinel request for `today`.
	pub async fn route_at(&self, question: &str, today: Date) -> Route {
		let detected = catalog::match_ticker(question);
		let prompt = build_router_prompt(question, today, detected);
		let request =
			CompletionRequest::new(&self.cfg.models.router, Some(ROUTER_SYSTEM_PROMPT.to_string()), prompt);
		let route = match self.complete("route", request).await {
			Ok(raw) => parse_route(&raw, detected),
			Err(err) => {
				tracing::warn!(error = %err, "Router call failed; using the sentinel period.");

				None
			},
		};
		let route = route.unwrap_or_else(|| Route {
			request: ReportRequest::sentinel(today),
			source: RouteSource::Fallback,
		});

		tracing::info!(
			ticker = route.request.ticker(),
			year = route.request.year(),
			quarter = route.request.quarter().as_str(),
			source = ?route.source,
			"Question routed."
		);

		route
	}
}

pub(crate) fn build_router_prompt(question: &str, today: Date, detected: Option<&str>) -> String {
	let today_label =
		format!("{:02}/{:02}/{}", today.day(), u8::from(today.month()), today.year());
	let hint = match detected {
		Some(ticker) => format!("Catalog match for this question: {ticker}. Prefer it."),
		None => "Catalog match for this question: none. Infer the ticker from the company named."
			.to_string(),
	};

	format!(
		"Current date: {today_label}\n\n\
		Ticker catalog (symbol: aliases):\n{listing}\n\n\
		{hint}\n\n\
		Period rules:\n\
		1. If the question names no period, use the most recently completed quarter before the \
		current date. On 13/02/2026 that is Q4 of 2025, since Q1 2026 has not ended.\n\
		2. Resolve relative terms (\"last year\", \"previous quarter\", \"năm ngoái\", \"quý trước\", \
		\"cùng kỳ\") against the current date.\n\
		3. A year without a quarter means Q4 of that year.\n\
		4. An explicit month or date maps to the calendar quarter containing it, so 30/09/2025 is \
		Q3 2025 and 31/12/2025 is Q4 2025.\n\n\
		Question: \"{question}\"\n\n\
		Answer with TICKER|YEAR|QUARTER only.",
		listing = catalog::alias_listing(),
	)
}

/// Parses `TICKER|YEAR|QUARTER` from the last non-empty output line.
///
/// Returns `None` when the line does not hold exactly three fields or the year or quarter is
/// unusable. Unknown tickers are replaced by `detected`, or by the default ticker.
pub(crate) fn parse_route(raw: &str, detected: Option<&str>) -> Option<Route> {
	let cleaned = grounding::remove_thinking(raw);
	let line = cleaned.lines().map(str::trim).rfind(|line| !line.is_empty())?;
	let fields: Vec<&str> = line.split('|').map(|field| field.trim().trim_matches('`')).collect();

	let [ticker, year, quarter] = fields.as_slice() else {
		tracing::warn!(output = line, "Router output is not TICKER|YEAR|QUARTER.");

		return None;
	};

	let year: i32 = year.parse().ok().filter(|year| (MIN_YEAR..=MAX_YEAR).contains(year))?;
	let quarter: Quarter = quarter.parse().ok()?;
	let ticker = ticker.to_uppercase();
	let (ticker, source) = if catalog::is_known_ticker(&ticker) {
		(ticker, RouteSource::Model)
	} else if let Some(detected) = detected {
		(detected.to_string(), RouteSource::CatalogOverride)
	} else {
		(DEFAULT_TICKER.to_string(), RouteSource::Fallback)
	};

	Some(Route { request: ReportRequest::new(&ticker, year, quarter), source })
}
