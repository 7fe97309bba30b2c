use std::time::Duration;

use futures::future;
use tokio::time;

use crate::{Error, FinragService, KnowledgeIndexHandle, Result, synthesis::Answer};
use finrag_domain::{evidence, period::ReportRequest};
use finrag_providers::IndexQuery;

#[derive(Debug, Clone)]
pub struct QueryOutcome {
	pub request: ReportRequest,
	/// The question itself followed by the planned queries.
	pub queries: Vec<String>,
	/// Kept index responses, in query order.
	pub contexts: Vec<String>,
	pub answer: Answer,
}

impl FinragService {
	/// Routes `question`, then answers it against the routed period's index.
	pub async fn ask(&self, question: &str) -> Result<QueryOutcome> {
		let route = self.route(question).await;

		self.query_period(question, &route.request).await
	}

	/// Answers `question` from the index of exactly `request`'s period.
	///
	/// Fails with [`Error::IndexUnavailable`] before any backend call when that index does not
	/// exist.
	pub async fn query_period(&self, question: &str, request: &ReportRequest) -> Result<QueryOutcome> {
		if question.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "question must be non-empty.".to_string() });
		}

		let resolved = self.resolver.resolve(request).await;

		if !resolved.available {
			tracing::info!(
				ticker = request.ticker(),
				year = request.year(),
				quarter = request.quarter().as_str(),
				"Knowledge index is unavailable."
			);

			return Err(Error::index_unavailable(request));
		}

		let mut queries = vec![question.trim().to_string()];

		queries.extend(self.plan_queries(question, request).await);

		let contexts = self.retrieve_contexts(&resolved.handle, &queries).await;
		let answer = self.synthesize_answer(question, &evidence::join_contexts(&contexts)).await;

		tracing::info!(
			ticker = request.ticker(),
			queries = queries.len(),
			contexts = contexts.len(),
			grounded = answer.is_grounded(),
			"Question answered."
		);

		Ok(QueryOutcome { request: request.clone(), queries, contexts, answer })
	}

	/// Issues every query concurrently and keeps the usable responses.
	///
	/// Waits for all queries. A query that fails or exceeds its timeout contributes nothing.
	pub async fn retrieve_contexts(
		&self,
		handle: &KnowledgeIndexHandle,
		queries: &[String],
	) -> Vec<String> {
		let responses =
			future::join_all(queries.iter().map(|query| self.query_index(handle, query))).await;
		let texts = responses.into_iter().zip(queries).filter_map(|(response, query)| match response {
			Ok(text) => Some(text),
			Err(err) => {
				tracing::warn!(error = %err, query = query.as_str(), "Index query failed.");

				None
			},
		});
		let retrieval = &self.cfg.retrieval;

		evidence::filter_contexts(
			texts,
			retrieval.min_chunk_chars as usize,
			retrieval.max_contexts as usize,
		)
	}

	async fn query_index(&self, handle: &KnowledgeIndexHandle, query: &str) -> Result<String> {
		let retrieval = &self.cfg.retrieval;
		let request = IndexQuery {
			query: query.to_string(),
			mode: retrieval.mode.clone(),
			top_k: retrieval.top_k,
			working_dir: handle.root().to_path_buf(),
		};
		let timeout_ms = retrieval.call_timeout_ms;
		let call = self.providers.index.query(&self.cfg.providers.knowledge_index, &request);

		match time::timeout(Duration::from_millis(timeout_ms), call).await {
			Ok(Ok(response)) => Ok(response.into_text()),
			Ok(Err(err)) => Err(err.into()),
			Err(_) => Err(Error::Timeout { operation: "index query", timeout_ms }),
		}
	}
}
