use std::time::Duration;

use futures::future;
use tokio::{sync::Semaphore, time};

use crate::FinragService;
use finrag_domain::{
	evidence::{self, EvidenceBundle, EvidenceEntry},
	period::ReportRequest,
	plan::InvestigationPlan,
};

impl FinragService {
	/// Answers every plan question against `request`'s index with bounded concurrency.
	///
	/// Questions that error, time out, retrieve nothing, or come back not found are dropped.
	/// Kept entries are ordered by their plan position.
	pub async fn gather_evidence(
		&self,
		request: &ReportRequest,
		plan: &InvestigationPlan,
	) -> EvidenceBundle {
		let permits = Semaphore::new(self.cfg.retrieval.question_concurrency as usize);
		let investigations = plan
			.questions
			.iter()
			.enumerate()
			.map(|(index, question)| self.investigate(&permits, request, index, question));
		let entries: Vec<EvidenceEntry> =
			future::join_all(investigations).await.into_iter().flatten().collect();

		tracing::info!(
			ticker = request.ticker(),
			planned = plan.questions.len(),
			kept = entries.len(),
			"Evidence gathered."
		);

		EvidenceBundle::from_entries(entries)
	}

	async fn investigate(
		&self,
		permits: &Semaphore,
		request: &ReportRequest,
		index: usize,
		question: &str,
	) -> Option<EvidenceEntry> {
		let _permit = permits.acquire().await.ok()?;
		let timeout_ms = self.cfg.retrieval.question_timeout_ms;
		let outcome = match time::timeout(
			Duration::from_millis(timeout_ms),
			self.query_period(question, request),
		)
		.await
		{
			Ok(Ok(outcome)) => outcome,
			Ok(Err(err)) => {
				tracing::warn!(error = %err, index, "Investigation question failed.");

				return None;
			},
			Err(_) => {
				tracing::warn!(index, timeout_ms, "Investigation question timed out.");

				return None;
			},
		};

		if outcome.contexts.is_empty()
			|| !outcome.answer.is_grounded()
			|| evidence::is_not_found(outcome.answer.text())
		{
			tracing::debug!(index, "Investigation question found nothing.");

			return None;
		}

		let report_cfg = &self.cfg.report;
		let excerpt = evidence::excerpt(
			&outcome.contexts,
			report_cfg.excerpt_contexts as usize,
			report_cfg.excerpt_chars as usize,
		);

		Some(EvidenceEntry {
			index,
			question: question.to_string(),
			summary: outcome.answer.text().to_string(),
			excerpt,
		})
	}
}
