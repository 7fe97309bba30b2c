use std::{sync::Arc, time::Duration};

use time::macros::date;
use tokio::time::Instant;

use crate::acceptance::{BALANCE_SHEET, GROUNDED_ANSWER};
use finrag_domain::{
	catalog::Industry,
	period::{DEFAULT_TICKER, Quarter, ReportRequest},
	plan::InvestigationPlan,
};
use finrag_service::RouteSource;
use finrag_testkit::{PLANNER_MODEL, ScriptedCompletion, StaticIndex, TestWorkspace};

#[tokio::test(start_paused = true)]
async fn slow_index_query_drops_only_its_context() {
	let workspace = TestWorkspace::new("index_call_timeout").expect("Failed to create workspace.");
	let request = ReportRequest::new("VCB", 2025, Quarter::Q4);
	let completion = Arc::new(ScriptedCompletion::replying(GROUNDED_ANSWER));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET).with_delay_by(|query| {
		if query.query == "Vốn chủ sở hữu VCB Q4/2025" {
			Duration::from_secs(5)
		} else {
			Duration::ZERO
		}
	}));
	let service = crate::acceptance::build_service(
		&workspace,
		"[retrieval]\ncall_timeout_ms = 1000\n",
		&completion,
		&index,
	);
	let handle = service.resolver.handle_for(&request);
	let queries = [
		"Tổng tài sản VCB Q4/2025".to_string(),
		"Vốn chủ sở hữu VCB Q4/2025".to_string(),
		"Cho vay khách hàng VCB Q4/2025".to_string(),
	];
	let started = Instant::now();
	let contexts = service.retrieve_contexts(&handle, &queries).await;

	assert_eq!(index.calls(), 3);
	assert_eq!(contexts.len(), 2);
	assert!(started.elapsed() >= Duration::from_secs(1));
	assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn slow_completion_times_out_into_fallback_route() {
	let workspace = TestWorkspace::new("completion_timeout").expect("Failed to create workspace.");
	let completion = Arc::new(
		ScriptedCompletion::replying("VCB|2025|Q4").with_delay(Duration::from_secs(400)),
	);
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let started = Instant::now();
	let route = service.route_at("Lợi nhuận VCB bao nhiêu?", date!(2026 - 02 - 13)).await;

	assert_eq!(route.request, ReportRequest::new(DEFAULT_TICKER, 2026, Quarter::Q1));
	assert_eq!(route.source, RouteSource::Fallback);
	assert_eq!(completion.calls(), 1);
	assert!(started.elapsed() >= Duration::from_millis(300_000));
	assert!(started.elapsed() < Duration::from_secs(400));
}

#[tokio::test]
async fn slow_question_is_dropped_from_the_bundle() {
	let workspace = TestWorkspace::new("question_timeout").expect("Failed to create workspace.");
	let request = ReportRequest::new("HPG", 2025, Quarter::Q3);

	workspace.create_index(&request).expect("Failed to create index.");

	let completion = Arc::new(ScriptedCompletion::new(|request| match request.model.as_str() {
		PLANNER_MODEL => Ok("Tổng tài sản HPG Q3/2025".to_string()),
		_ => Ok(GROUNDED_ANSWER.to_string()),
	}));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET).with_delay_by(|query| {
		if query.query == "câu 1?" { Duration::from_secs(10) } else { Duration::ZERO }
	}));
	let service = crate::acceptance::build_service(
		&workspace,
		"[retrieval]\nquestion_timeout_ms = 500\n",
		&completion,
		&index,
	);
	let plan = InvestigationPlan {
		industry: Industry::General,
		questions: vec!["câu 0?".to_string(), "câu 1?".to_string(), "câu 2?".to_string()],
	};
	let started = std::time::Instant::now();
	let bundle = service.gather_evidence(&request, &plan).await;

	assert!(started.elapsed() < Duration::from_secs(10));
	assert_eq!(bundle.len(), 2);
	assert_eq!(bundle.entries.iter().map(|entry| entry.index).collect::<Vec<_>>(), vec![0, 2]);
	assert!(bundle.entries.iter().all(|entry| entry.summary == GROUNDED_ANSWER));
}
