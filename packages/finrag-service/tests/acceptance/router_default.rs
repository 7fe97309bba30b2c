use std::sync::Arc;

use time::macros::date;

use crate::acceptance::{BALANCE_SHEET, GROUNDED_ANSWER};
use finrag_domain::period::{DEFAULT_TICKER, Quarter, ReportRequest};
use finrag_service::RouteSource;
use finrag_testkit::{ROUTER_MODEL, ScriptedCompletion, StaticIndex, TestWorkspace};

#[tokio::test]
async fn unqualified_question_routes_to_last_completed_quarter() {
	let workspace = TestWorkspace::new("router_default").expect("Failed to create workspace.");
	let completion = Arc::new(crate::acceptance::pipeline_completion(
		"<think>Hôm nay 13/02/2026, Q1/2026 chưa kết thúc.</think>\nVCB|2025|Q4",
		GROUNDED_ANSWER,
		"",
	));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let route = service.route_at("Lợi nhuận VCB bao nhiêu?", date!(2026 - 02 - 13)).await;

	assert_eq!(route.request, ReportRequest::new("VCB", 2025, Quarter::Q4));
	assert_eq!(route.source, RouteSource::Model);

	let requests = completion.requests();
	let prompt = &requests[0].user;

	assert_eq!(requests[0].model, ROUTER_MODEL);
	assert_eq!(requests[0].temperature, 0.0);
	assert!(prompt.contains("Current date: 13/02/2026"));
	assert!(prompt.contains("Catalog match for this question: VCB."));
	assert_eq!(index.calls(), 0);
}

#[tokio::test]
async fn unknown_model_ticker_is_replaced_by_catalog_match() {
	let workspace = TestWorkspace::new("router_override").expect("Failed to create workspace.");
	let completion = Arc::new(ScriptedCompletion::replying("VIETJET AIR|2024|Q2"));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let route = service.route_at("Doanh thu Vietjet quý 2/2024?", date!(2026 - 02 - 13)).await;

	assert_eq!(route.request, ReportRequest::new("VJC", 2024, Quarter::Q2));
	assert_eq!(route.source, RouteSource::CatalogOverride);
}

#[tokio::test]
async fn backend_failure_yields_sentinel() {
	let workspace = TestWorkspace::new("router_failure").expect("Failed to create workspace.");
	let completion = Arc::new(ScriptedCompletion::failing());
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let route = service.route_at("Lợi nhuận VCB bao nhiêu?", date!(2026 - 02 - 13)).await;

	assert_eq!(route.request, ReportRequest::new(DEFAULT_TICKER, 2026, Quarter::Q1));
	assert_eq!(route.source, RouteSource::Fallback);
	assert_eq!(completion.calls(), 1);
}

#[tokio::test]
async fn malformed_output_yields_sentinel() {
	let workspace = TestWorkspace::new("router_malformed").expect("Failed to create workspace.");
	let completion = Arc::new(ScriptedCompletion::replying("VCB, 2025, Q4"));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let route = service.route_at("Lợi nhuận VCB bao nhiêu?", date!(2025 - 08 - 01)).await;

	assert_eq!(route.request, ReportRequest::new(DEFAULT_TICKER, 2025, Quarter::Q3));
	assert!(route.request.is_sentinel());
}
