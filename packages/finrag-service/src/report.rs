use serde::Serialize;

use crate::{Error, FinragService, Result};
use finrag_domain::{
	catalog::Industry,
	evidence::EvidenceBundle,
	grounding,
	period::ReportRequest,
	plan::InvestigationPlan,
};
use finrag_providers::CompletionRequest;

const REPORT_SYSTEM_PROMPT: &str = "You are a senior equity analyst covering Vietnamese listed \
companies. You write forensic financial statement reviews in Vietnamese Markdown, using only the \
evidence you are given.";

const REPORT_SECTIONS: &str = "Structure the report with exactly these sections:\n\
## 1. Chất lượng kiểm toán\nAuditor opinion, qualifications, emphasis of matter.\n\
## 2. Sức khỏe bảng cân đối kế toán\nAssets, liabilities, equity, leverage, asset quality.\n\
## 3. Kết quả kinh doanh\nRevenue, margins, profit drivers, unusual items.\n\
## 4. Dòng tiền so với lợi nhuận\nOperating cash flow against reported profit, with the gap explained.\n\
## 5. Rủi ro và cơ hội\nRed flags, related-party exposure, upside factors.\n\
## 6. Kết luận\nOverall assessment in three to five sentences.";

const REPORT_RULES: &str = "Rules:\n\
- Cite only figures that appear in the evidence, copied exactly as printed.\n\
- When the evidence does not cover a section, say so in that section instead of guessing.\n\
- Cross-check each AI SUMMARY against its SOURCE EXCERPT and prefer the excerpt when they differ.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
	/// Read back from the report store. No backend call was made.
	Cache,
	Generated,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
	pub request: ReportRequest,
	pub content: String,
	pub source: ReportSource,
	/// False when a generated report could not be written to the store.
	pub persisted: bool,
	/// `None` for cache hits.
	pub industry: Option<Industry>,
	pub evidence_count: usize,
}

impl FinragService {
	/// Returns the stored report for `request`, or investigates, writes and stores a new one.
	///
	/// A stored report is returned unchanged. Generation fails with [`Error::EmptyEvidence`]
	/// when no plan question produced usable evidence. A failed store is logged and reported
	/// through [`ReportOutcome::persisted`]; the content is still returned.
	pub async fn generate_report(&self, request: &ReportRequest) -> Result<ReportOutcome> {
		match self.reports.load(request).await {
			Ok(Some(content)) => {
				tracing::info!(
					ticker = request.ticker(),
					year = request.year(),
					quarter = request.quarter().as_str(),
					hit = true,
					"Report cache hit."
				);

				return Ok(ReportOutcome {
					request: request.clone(),
					content,
					source: ReportSource::Cache,
					persisted: true,
					industry: None,
					evidence_count: 0,
				});
			},
			Ok(None) => {},
			Err(err) => {
				tracing::warn!(error = %err, "Report cache read failed; regenerating.");
			},
		}

		if !self.resolver.resolve(request).await.available {
			tracing::warn!(
				ticker = request.ticker(),
				year = request.year(),
				quarter = request.quarter().as_str(),
				"Knowledge index is unavailable; evidence gathering will find nothing."
			);
		}

		let plan = InvestigationPlan::for_request(request);
		let bundle = self.gather_evidence(request, &plan).await;

		if bundle.is_empty() {
			return Err(Error::empty_evidence(request));
		}

		let content = self.write_report(request, plan.industry, &bundle).await?;
		let persisted = match self.reports.store(request, &content).await {
			Ok(path) => {
				tracing::info!(path = %path.display(), "Report stored.");

				true
			},
			Err(err) => {
				tracing::warn!(error = %err, "Report store failed; returning unsaved report.");

				false
			},
		};

		Ok(ReportOutcome {
			request: request.clone(),
			content,
			source: ReportSource::Generated,
			persisted,
			industry: Some(plan.industry),
			evidence_count: bundle.len(),
		})
	}

	async fn write_report(
		&self,
		request: &ReportRequest,
		industry: Industry,
		bundle: &EvidenceBundle,
	) -> Result<String> {
		let prompt = build_report_prompt(request, industry, bundle);
		let completion = CompletionRequest::new(
			&self.cfg.models.report,
			Some(REPORT_SYSTEM_PROMPT.to_string()),
			prompt,
		);
		let content = grounding::remove_thinking(&self.complete("report", completion).await?);

		if content.is_empty() {
			return Err(Error::Provider { message: "Report model returned no content.".to_string() });
		}

		Ok(content)
	}
}

pub(crate) fn build_report_prompt(
	request: &ReportRequest,
	industry: Industry,
	bundle: &EvidenceBundle,
) -> String {
	format!(
		"Company: {ticker}\nPeriod: {period}\nIndustry: {industry}\n\n\
		{REPORT_SECTIONS}\n\n{REPORT_RULES}\n\n\
		Evidence ({count} items):\n{dossier}",
		ticker = request.ticker(),
		period = request.period(),
		count = bundle.len(),
		dossier = bundle.render(),
	)
}
