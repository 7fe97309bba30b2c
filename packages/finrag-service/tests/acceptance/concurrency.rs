use std::{sync::Arc, time::Duration};

use crate::acceptance::{BALANCE_SHEET, GROUNDED_ANSWER};
use finrag_domain::{
	catalog::Industry,
	period::{Quarter, ReportRequest},
	plan::InvestigationPlan,
};
use finrag_testkit::{StaticIndex, TestWorkspace};

#[tokio::test]
async fn eighteen_questions_never_exceed_five_in_flight() {
	let workspace = TestWorkspace::new("gather_bound").expect("Failed to create workspace.");
	let request = ReportRequest::new("HPG", 2025, Quarter::Q3);

	workspace.create_index(&request).expect("Failed to create index.");

	let completion = Arc::new(
		crate::acceptance::pipeline_completion("HPG|2025|Q3", GROUNDED_ANSWER, "")
			.with_delay(Duration::from_millis(20)),
	);
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let plan = InvestigationPlan {
		industry: Industry::General,
		questions: (0..18).map(|i| format!("Câu hỏi điều tra số {i} về HPG Q3/2025?")).collect(),
	};
	let bundle = service.gather_evidence(&request, &plan).await;

	assert!(completion.max_active() <= 5, "observed {} in flight", completion.max_active());
	assert!(completion.max_active() > 1);
	assert_eq!(bundle.len(), 18);
	assert!(bundle.entries.windows(2).all(|pair| pair[0].index < pair[1].index));
}

#[tokio::test]
async fn unanswered_questions_are_dropped() {
	let workspace = TestWorkspace::new("gather_drop").expect("Failed to create workspace.");
	let request = ReportRequest::new("HPG", 2025, Quarter::Q3);

	workspace.create_index(&request).expect("Failed to create index.");

	let completion = Arc::new(finrag_testkit::ScriptedCompletion::new(|request| {
		match request.model.as_str() {
			finrag_testkit::PLANNER_MODEL => Ok("Tổng tài sản HPG Q3/2025".to_string()),
			_ if request.user.contains("câu 1?") => Ok(GROUNDED_ANSWER.to_string()),
			_ => Ok("Data is not available in the report.".to_string()),
		}
	}));
	let index = Arc::new(StaticIndex::with_text(BALANCE_SHEET));
	let service = crate::acceptance::build_service(&workspace, "", &completion, &index);
	let plan = InvestigationPlan {
		industry: Industry::General,
		questions: vec!["câu 0?".to_string(), "câu 1?".to_string(), "câu 2?".to_string()],
	};
	let bundle = service.gather_evidence(&request, &plan).await;

	assert_eq!(bundle.len(), 1);
	assert_eq!(bundle.entries[0].index, 1);
	assert_eq!(bundle.entries[0].summary, GROUNDED_ANSWER);
	assert!(bundle.entries[0].excerpt.starts_with("BẢNG CÂN ĐỐI KẾ TOÁN"));
	assert_eq!(bundle.entries[0].excerpt.lines().count(), 2);
}
