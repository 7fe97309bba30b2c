//! Statement-type and line-item code hints for Vietnamese (VAS) financial statements.

use std::fmt;

use unicode_normalization::UnicodeNormalization;

const MAX_HINTS: usize = 4;

const BALANCE_SHEET_TERMS: &[&str] = &["TÀI SẢN", "NỢ", "VỐN", "VAY", "TIỀN GỬI"];
const INCOME_TERMS: &[&str] = &["LỢI NHUẬN", "DOANH THU", "LÃI", "CHI PHÍ"];
const CASH_FLOW_TERMS: &[&str] = &["LƯU CHUYỂN", "DÒNG TIỀN", "TIỀN THU", "TIỀN CHI", "LCTT"];

/// Line-item keyword → statement codes and canonical labels.
const LINE_ITEM_CODES: &[(&str, &[&str])] = &[
	("TỔNG TÀI SẢN", &["Mã số 270", "Tổng tài sản"]),
	("TIỀN", &["Mã số 110", "Tiền và các khoản tương đương tiền"]),
	("ĐẦU TƯ TÀI CHÍNH", &["Mã số 120", "Mã số 250"]),
	("PHẢI THU", &["Mã số 130", "Mã số 210"]),
	("HÀNG TỒN KHO", &["Mã số 140", "Hàng tồn kho"]),
	("TÀI SẢN CỐ ĐỊNH", &["Mã số 220"]),
	("NỢ PHẢI TRẢ", &["Mã số 300", "Tổng nợ phải trả"]),
	("VAY", &["Mã số 320", "Mã số 338", "Vay và nợ thuê tài chính"]),
	("VỐN CHỦ SỞ HỮU", &["Mã số 400", "Mã số 410"]),
	("DOANH THU", &["Mã số 01", "Mã số 10", "Doanh thu thuần"]),
	("GIÁ VỐN", &["Mã số 11", "Giá vốn hàng bán"]),
	("LỢI NHUẬN GỘP", &["Mã số 20"]),
	("DOANH THU TÀI CHÍNH", &["Mã số 21"]),
	("CHI PHÍ TÀI CHÍNH", &["Mã số 22"]),
	("CHI PHÍ BÁN HÀNG", &["Mã số 25"]),
	("CHI PHÍ QUẢN LÝ", &["Mã số 26"]),
	("LỢI NHUẬN THUẦN", &["Mã số 30"]),
	("LỢI NHUẬN TRƯỚC THUẾ", &["Mã số 50", "Tổng lợi nhuận kế toán trước thuế"]),
	("LỢI NHUẬN SAU THUẾ", &["Mã số 60", "Lợi nhuận sau thuế thu nhập doanh nghiệp"]),
	("THU NHẬP LÃI THUẦN", &["Thu nhập lãi thuần"]),
	("LÃI THUẦN DỊCH VỤ", &["Lãi thuần từ hoạt động dịch vụ"]),
	("DỰ PHÒNG RỦI RO", &["Chi phí dự phòng rủi ro tín dụng"]),
	(
		"LƯU CHUYỂN TIỀN TỪ HĐKD",
		&[
			"Mã số 20",
			"Lưu chuyển tiền thuần từ hoạt động kinh doanh",
			"Dòng tiền thuần từ hoạt động kinh doanh",
		],
	),
	("LƯU CHUYỂN TIỀN TỪ ĐẦU TƯ", &["Mã số 30", "Lưu chuyển tiền thuần từ hoạt động đầu tư"]),
	(
		"LƯU CHUYỂN TIỀN TỪ TÀI CHÍNH",
		&["Mã số 40", "Lưu chuyển tiền thuần từ hoạt động tài chính"],
	),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
	BalanceSheet,
	IncomeStatement,
	CashFlow,
}
impl StatementKind {
	/// Statement title as printed in Vietnamese filings.
	pub fn title(self) -> &'static str {
		match self {
			Self::BalanceSheet => "Bảng cân đối kế toán",
			Self::IncomeStatement => "Báo cáo kết quả hoạt động kinh doanh",
			Self::CashFlow => "Báo cáo lưu chuyển tiền tệ",
		}
	}
}
impl fmt::Display for StatementKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.title())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementHints {
	pub statement: Option<StatementKind>,
	pub codes: Vec<&'static str>,
}
impl StatementHints {
	pub fn is_empty(&self) -> bool {
		self.statement.is_none() && self.codes.is_empty()
	}
}

/// Which statement a question most likely targets, and up to four code/label anchors.
///
/// Cash-flow phrasing is checked first: cash-flow line items name balance-sheet accounts, as in
/// "Tiền chi mua sắm tài sản cố định" or "Tiền thu từ đi vay".
pub fn statement_hints(question: &str) -> StatementHints {
	let upper = question.nfc().collect::<String>().to_uppercase();
	let statement = if CASH_FLOW_TERMS.iter().any(|term| upper.contains(term)) {
		Some(StatementKind::CashFlow)
	} else if BALANCE_SHEET_TERMS.iter().any(|term| upper.contains(term)) {
		Some(StatementKind::BalanceSheet)
	} else if INCOME_TERMS.iter().any(|term| upper.contains(term)) {
		Some(StatementKind::IncomeStatement)
	} else {
		None
	};
	let abbreviated_cash_flow = upper.contains("LCTT");
	let mut codes = Vec::new();

	for (key, anchors) in LINE_ITEM_CODES {
		let matched = upper.contains(key) || (abbreviated_cash_flow && key.contains("LƯU CHUYỂN"));

		if !matched {
			continue;
		}

		for anchor in anchors.iter() {
			if !codes.contains(anchor) {
				codes.push(*anchor);
			}
		}
	}

	codes.truncate(MAX_HINTS);

	StatementHints { statement, codes }
}
