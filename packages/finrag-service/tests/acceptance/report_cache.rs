use std::{fs, sync::Arc};

use crate::acceptance::{BALANCE_SHEET, GROUNDED_ANSWER};
use finrag_domain::{
	catalog::Industry,
	period::{Quarter, ReportRequest},
};
use finrag_service::{Error, ReportSource};
use finrag_testkit::{REPORT_MODEL, StaticIndex, TestWorkspace};

const REPORT: &str = "## 1. Chất lượng kiểm toán\nÝ kiến chấp nhận toàn phần.\n\n## 6. Kết luận\nỔn định.";

fn vcb_q4() -> ReportRequest {
	ReportRequest::new("VCB", 2025, Quarter::Q4)
}

#[tokio::test]
async fn stored_report_is_returned_without_backend_calls() {
	let workspace = TestWorkspace::new("report_hit").expect("Failed to create workspace.");
	let completion =
		Arc::new(crate::acceptance::pipeline_completion("VCB|2025|Q4", GROUNDED_ANSWER, REPORT));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let path = workspace.report_root().join("VCB/2025/Q4.md");

	fs::create_dir_all(path.parent().expect("Report path has a parent."))
		.expect("Failed to create report dir.");
	fs::write(&path, "Báo cáo đã lưu.\n").expect("Failed to seed report.");

	let outcome = service.generate_report(&vcb_q4()).await.expect("generate_report failed.");

	assert_eq!(outcome.content, "Báo cáo đã lưu.\n");
	assert_eq!(outcome.source, ReportSource::Cache);
	assert_eq!(completion.calls(), 0);
	assert_eq!(index.calls(), 0);
}

#[tokio::test]
async fn second_request_is_byte_identical_and_free() {
	let workspace = TestWorkspace::new("report_idempotent").expect("Failed to create workspace.");

	workspace.create_index(&vcb_q4()).expect("Failed to create index.");

	let completion =
		Arc::new(crate::acceptance::pipeline_completion("VCB|2025|Q4", GROUNDED_ANSWER, REPORT));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let first = service.generate_report(&vcb_q4()).await.expect("First report failed.");
	let calls_after_first = completion.calls();
	let second = service.generate_report(&vcb_q4()).await.expect("Second report failed.");

	assert_eq!(first.source, ReportSource::Generated);
	assert!(first.persisted);
	assert_eq!(first.industry, Some(Industry::Bank));
	assert_eq!(first.evidence_count, 15);
	assert_eq!(first.content, REPORT);
	assert_eq!(completion.calls_for(REPORT_MODEL), 1);
	assert_eq!(second.source, ReportSource::Cache);
	assert_eq!(second.content.as_bytes(), first.content.as_bytes());
	assert_eq!(completion.calls(), calls_after_first);
	assert_eq!(
		fs::read_to_string(workspace.report_root().join("VCB/2025/Q4.md"))
			.expect("Stored report missing."),
		REPORT
	);
}

#[tokio::test]
async fn empty_evidence_is_a_distinct_failure() {
	let workspace = TestWorkspace::new("report_empty").expect("Failed to create workspace.");

	workspace.create_index(&vcb_q4()).expect("Failed to create index.");

	let completion = Arc::new(crate::acceptance::pipeline_completion(
		"VCB|2025|Q4",
		"Data is not available in the report.",
		REPORT,
	));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let err = service.generate_report(&vcb_q4()).await.expect_err("Expected empty evidence.");

	assert!(matches!(err, Error::EmptyEvidence { .. }));
	assert_eq!(completion.calls_for(REPORT_MODEL), 0);
	assert!(!workspace.report_root().join("VCB/2025/Q4.md").exists());
}

#[tokio::test]
async fn missing_index_ends_in_empty_evidence() {
	let workspace = TestWorkspace::new("report_no_index").expect("Failed to create workspace.");
	let completion =
		Arc::new(crate::acceptance::pipeline_completion("VCB|2025|Q4", GROUNDED_ANSWER, REPORT));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let err = service.generate_report(&vcb_q4()).await.expect_err("Expected empty evidence.");

	assert!(matches!(err, Error::EmptyEvidence { .. }));
	assert_eq!(completion.calls(), 0);
}

#[tokio::test]
async fn store_failure_still_returns_the_report() {
	let workspace = TestWorkspace::new("report_store_fail").expect("Failed to create workspace.");

	workspace.create_index(&vcb_q4()).expect("Failed to create index.");
	// A file where the ticker directory should be makes the store fail.
	fs::write(workspace.report_root().join("VCB"), "blocked").expect("Failed to block store.");

	let completion =
		Arc::new(crate::acceptance::pipeline_completion("VCB|2025|Q4", GROUNDED_ANSWER, REPORT));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let outcome = service.generate_report(&vcb_q4()).await.expect("generate_report failed.");

	assert_eq!(outcome.content, REPORT);
	assert_eq!(outcome.source, ReportSource::Generated);
	assert!(!outcome.persisted);
}
