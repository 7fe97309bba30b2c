use std::sync::Arc;

use color_eyre::eyre;

use crate::acceptance::{BALANCE_SHEET, GROUNDED_ANSWER, PLANNED_QUERIES};
use finrag_domain::{
	grounding::NOT_AVAILABLE_ANSWER,
	period::{Quarter, ReportRequest},
};
use finrag_providers::IndexResponse;
use finrag_service::Answer;
use finrag_testkit::{
	PLANNER_MODEL, ROUTER_MODEL, SYNTHESIZER_MODEL, ScriptedCompletion, StaticIndex, TestWorkspace,
};

const QUESTION: &str = "Tổng tài sản của VCB là bao nhiêu?";

fn vcb_q4() -> ReportRequest {
	ReportRequest::new("VCB", 2025, Quarter::Q4)
}

#[tokio::test]
async fn grounded_answer_comes_from_the_requested_period() {
	let workspace = TestWorkspace::new("query_grounded").expect("Failed to create workspace.");
	let index_path = workspace.create_index(&vcb_q4()).expect("Failed to create index.");
	let completion =
		Arc::new(crate::acceptance::pipeline_completion("VCB|2025|Q4", GROUNDED_ANSWER, ""));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let outcome = service.query_period(QUESTION, &vcb_q4()).await.expect("query_period failed.");

	assert_eq!(outcome.answer, Answer::Grounded(GROUNDED_ANSWER.to_string()));
	assert_eq!(outcome.queries.len(), 4);
	assert_eq!(outcome.queries[0], QUESTION);
	assert_eq!(outcome.contexts.len(), 4);
	assert!(index.queries().iter().all(|query| query.working_dir == index_path));
	assert!(index.queries().iter().all(|query| query.mode == "hybrid" && query.top_k == 100));
	assert_eq!(completion.calls_for(ROUTER_MODEL), 0);
	assert_eq!(completion.calls_for(PLANNER_MODEL), 1);
	assert_eq!(completion.calls_for(SYNTHESIZER_MODEL), 1);
}

#[tokio::test]
async fn ask_routes_then_answers() {
	let workspace = TestWorkspace::new("query_ask").expect("Failed to create workspace.");

	workspace.create_index(&vcb_q4()).expect("Failed to create index.");

	let completion =
		Arc::new(crate::acceptance::pipeline_completion("VCB|2025|Q4", GROUNDED_ANSWER, ""));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let outcome = service.ask(QUESTION).await.expect("ask failed.");

	assert_eq!(outcome.request, vcb_q4());
	assert!(outcome.answer.is_grounded());
	assert_eq!(completion.calls_for(ROUTER_MODEL), 1);
}

#[tokio::test]
async fn short_responses_are_filtered_in_order() {
	let workspace = TestWorkspace::new("query_filter").expect("Failed to create workspace.");

	workspace.create_index(&vcb_q4()).expect("Failed to create index.");

	let completion = Arc::new(crate::acceptance::pipeline_completion(
		"VCB|2025|Q4",
		"Không tìm thấy số liệu.",
		"",
	));
	let planned: Vec<String> =
		PLANNED_QUERIES.lines().map(|line| line[3..].to_string()).collect();
	let sizes = [
		(QUESTION.to_string(), 50),
		(planned[0].clone(), 250),
		(planned[1].clone(), 199),
		(planned[2].clone(), 300),
	];
	let index = Arc::new(StaticIndex::new(move |query| {
		let size = sizes
			.iter()
			.find(|(text, _)| *text == query.query)
			.map(|(_, size)| *size)
			.ok_or_else(|| eyre::eyre!("Unexpected query {}.", query.query))?;

		Ok(IndexResponse::Text("đ".repeat(size)))
	}));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let outcome = service.query_period(QUESTION, &vcb_q4()).await.expect("query_period failed.");
	let kept: Vec<usize> = outcome.contexts.iter().map(|context| context.chars().count()).collect();

	assert_eq!(kept, vec![250, 300]);
	assert!(!outcome.answer.is_grounded());
}

#[tokio::test]
async fn invented_figures_are_replaced_by_refusal() {
	let workspace = TestWorkspace::new("query_invented").expect("Failed to create workspace.");

	workspace.create_index(&vcb_q4()).expect("Failed to create index.");

	let completion = Arc::new(crate::acceptance::pipeline_completion(
		"VCB|2025|Q4",
		"Tổng tài sản của VCB khoảng 2.150.000.000 triệu đồng.",
		"",
	));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let outcome = service.query_period(QUESTION, &vcb_q4()).await.expect("query_period failed.");

	assert_eq!(outcome.answer, Answer::NotAvailable(NOT_AVAILABLE_ANSWER.to_string()));
}

#[tokio::test]
async fn empty_retrieval_skips_synthesis() {
	let workspace = TestWorkspace::new("query_empty").expect("Failed to create workspace.");

	workspace.create_index(&vcb_q4()).expect("Failed to create index.");

	let completion =
		Arc::new(crate::acceptance::pipeline_completion("VCB|2025|Q4", GROUNDED_ANSWER, ""));
	let index = Arc::new(StaticIndex::new(|_| Err(eyre::eyre!("Index server is down."))));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let outcome = service.query_period(QUESTION, &vcb_q4()).await.expect("query_period failed.");

	assert!(outcome.contexts.is_empty());
	assert_eq!(outcome.answer, Answer::not_available());
	assert_eq!(index.calls(), 4);
	assert_eq!(completion.calls_for(SYNTHESIZER_MODEL), 0);
}

#[tokio::test]
async fn planner_failure_falls_back_to_templates() {
	let workspace = TestWorkspace::new("query_planner_down").expect("Failed to create workspace.");

	workspace.create_index(&vcb_q4()).expect("Failed to create index.");

	let completion = Arc::new(ScriptedCompletion::new(|request| match request.model.as_str() {
		SYNTHESIZER_MODEL => Ok(GROUNDED_ANSWER.to_string()),
		_ => Err(eyre::eyre!("Planner backend unavailable.")),
	}));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let outcome = service.query_period(QUESTION, &vcb_q4()).await.expect("query_period failed.");

	assert_eq!(
		outcome.queries,
		vec![
			QUESTION.to_string(),
			format!("{QUESTION} 2025"),
			"Báo cáo tài chính VCB 2025".to_string(),
		]
	);
	assert!(outcome.answer.is_grounded());
}

#[tokio::test]
async fn cached_expansion_skips_the_planner() {
	let workspace = TestWorkspace::new("query_expansion_cache").expect("Failed to create workspace.");

	workspace.create_index(&vcb_q4()).expect("Failed to create index.");

	let completion =
		Arc::new(crate::acceptance::pipeline_completion("VCB|2025|Q4", GROUNDED_ANSWER, ""));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(
		&workspace,
		"[planner]\ncache_enabled = true\ncache_ttl_secs = 3600\n",
		&completion,
		&index,
	);
	let first = service.plan_queries(QUESTION, &vcb_q4()).await;
	let second = service.plan_queries(QUESTION, &vcb_q4()).await;

	assert_eq!(first, second);
	assert_eq!(first.len(), 3);
	assert_eq!(completion.calls_for(PLANNER_MODEL), 1);
}
