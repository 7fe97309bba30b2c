use serde::Serialize;

use crate::FinragService;
use finrag_domain::{
	evidence,
	grounding::{self, NOT_AVAILABLE_ANSWER},
	statement::{self, StatementHints},
};
use finrag_providers::CompletionRequest;

const SYNTHESIZER_SYSTEM_PROMPT: &str = "You are a financial statement analyst. You answer strictly \
from the supplied context, in the language of the question.";

const GROUNDING_RULES: &str = "Rules:\n\
1. Use only figures printed in the context. Keep every digit as printed. Never estimate, round, \
extrapolate or recall figures from memory. Rule 9 is the only exception.\n\
2. Reuse the line item label exactly as printed in the context. Do not rename or paraphrase it.\n\
3. The context must belong to the company or ticker named in the question. If it belongs to \
another company or the company cannot be identified, treat the figure as missing.\n\
4. An as-of date (\"tại ngày 31/12/2025\", \"tại 30/09/2025\") points to the Bảng cân đối kế toán. \
A period (\"trong 9 tháng\", \"lũy kế\", \"quý 3\") points to the Báo cáo kết quả hoạt động kinh \
doanh or the Báo cáo lưu chuyển tiền tệ. Read the column of that date or period.\n\
5. State the unit from the table header (đồng, triệu đồng, tỷ đồng).\n\
6. If the operating cash flow total (Lưu chuyển tiền thuần từ hoạt động kinh doanh) appears \
twice, take the final aggregate row. Never compute it.\n\
7. When figures conflict, choose the label closest to the question first, then the row of a \
coded table (Mã số), then the exact date or period. If it is still ambiguous, treat the figure \
as missing.\n\
8. Write negative values with a leading minus: (398.631.979.587) becomes -398.631.979.587. Group \
thousands with . even when the context prints , and keep decimal digits as printed.\n\
9. Only when the question asks for profit after tax and the context prints no Lợi nhuận sau thuế \
line, but prints both Lợi nhuận kế toán trước thuế and Chi phí thuế thu nhập doanh nghiệp for the \
same period and unit, answer pre-tax profit minus the tax expense and annotate it inline as \
(tính từ A - B). No other computation is allowed.\n\
10. If the requested figure is missing, reply exactly: \"Data is not available in the report.\"\n\
11. Answer in exactly one sentence: <label> của <company> <period> là <figure> <unit>. No line \
breaks, bullets or reasoning.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Answer {
	Grounded(String),
	/// A refusal, either the model's own or the fixed sentence.
	NotAvailable(String),
}
impl Answer {
	pub fn not_available() -> Self {
		Self::NotAvailable(NOT_AVAILABLE_ANSWER.to_string())
	}

	pub fn text(&self) -> &str {
		match self {
			Self::Grounded(text) | Self::NotAvailable(text) => text,
		}
	}

	pub fn is_grounded(&self) -> bool {
		matches!(self, Self::Grounded(_))
	}
}

impl FinragService {
	/// Answers `question` from `context` only.
	///
	/// Every numeric token of the returned text traces to `context` or to a date or period of
	/// `question`; an answer that fails the check is replaced by the fixed refusal.
	pub async fn synthesize_answer(&self, question: &str, context: &str) -> Answer {
		if context.chars().count() < self.cfg.retrieval.min_context_chars as usize {
			tracing::info!(
				context_chars = context.chars().count(),
				"Context too short; answering not available."
			);

			return Answer::not_available();
		}

		let hints = statement::statement_hints(question);
		let prompt = build_synthesis_prompt(question, context, &hints);
		let request = CompletionRequest::new(
			&self.cfg.models.synthesizer,
			Some(SYNTHESIZER_SYSTEM_PROMPT.to_string()),
			prompt,
		);
		let raw = match self.complete("synthesize", request).await {
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(error = %err, "Answer synthesis failed.");

				return Answer::not_available();
			},
		};

		check_grounding(&grounding::strip_thinking(&raw), context, question)
	}
}

pub(crate) fn build_synthesis_prompt(question: &str, context: &str, hints: &StatementHints) -> String {
	let mut prompt = format!("Context:\n{context}\n\n{GROUNDING_RULES}\n");

	if let Some(kind) = hints.statement {
		prompt.push_str(&format!("\nLook first in the {}.", kind.title()));
	}
	if !hints.codes.is_empty() {
		prompt.push_str(&format!("\nRelevant line items: {}.", hints.codes.join("; ")));
	}

	prompt.push_str(&format!("\n\nQuestion: {question}"));

	prompt
}

/// Classifies a cleaned model answer and enforces numeric provenance.
pub(crate) fn check_grounding(answer: &str, context: &str, question: &str) -> Answer {
	if answer.is_empty() {
		return Answer::not_available();
	}

	let ungrounded = grounding::ungrounded_numbers(answer, context, question);

	if !ungrounded.is_empty() {
		tracing::warn!(
			ungrounded = ?ungrounded,
			"Answer cites figures absent from the context; replacing with refusal."
		);

		return Answer::not_available();
	}
	if evidence::is_not_found(answer) {
		return Answer::NotAvailable(answer.to_string());
	}

	Answer::Grounded(answer.to_string())
}
