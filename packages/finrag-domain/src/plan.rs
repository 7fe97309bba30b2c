use serde::{Deserialize, Serialize};

use crate::{catalog::Industry, period::ReportRequest};

/// Ordered, industry-conditioned investigative questions for one report request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationPlan {
	pub industry: Industry,
	pub questions: Vec<String>,
}
impl InvestigationPlan {
	pub fn for_request(request: &ReportRequest) -> Self {
		let industry = Industry::classify(request.ticker());
		let t = request.ticker();
		let q = request.quarter();
		let y = request.year();
		let mut questions = vec![
			format!(
				"Ý kiến của kiểm toán viên đối với báo cáo tài chính {q}/{y} của {t} là chấp nhận toàn phần hay có ngoại trừ?"
			),
			format!("Tổng tài sản và vốn chủ sở hữu của {t} tại ngày kết thúc {q}/{y} là bao nhiêu?"),
			format!(
				"Lưu chuyển tiền thuần từ hoạt động kinh doanh của {t} trong {q}/{y} là dương hay âm, giá trị cụ thể bao nhiêu?"
			),
			format!("Lợi nhuận sau thuế so với dòng tiền từ hoạt động kinh doanh của {t} trong {q}/{y}?"),
			format!("Các giao dịch trọng yếu với bên liên quan của {t} được thuyết minh thế nào trong {q}/{y}?"),
			format!("Báo cáo kết quả kinh doanh {q}/{y} của {t} có khoản mục bất thường nào không?"),
		];
		let specific: Vec<String> = match industry {
			Industry::Bank => vec![
				format!("Cho vay khách hàng của {t} tại ngày kết thúc {q}/{y} là bao nhiêu?"),
				format!("Tiền gửi của khách hàng tại {t} thay đổi thế nào trong {q}/{y}?"),
				format!("Tỷ lệ nợ xấu (nợ nhóm 3, 4, 5) của {t} trong {q}/{y} biến động ra sao?"),
				format!(
					"Chi phí dự phòng rủi ro tín dụng của {t} trong {q}/{y} là bao nhiêu, so với cùng kỳ năm trước?"
				),
				format!("Thu nhập lãi thuần của {t} trong {q}/{y} là bao nhiêu?"),
				format!("Lãi thuần từ hoạt động dịch vụ của {t} trong {q}/{y} là bao nhiêu?"),
				format!("Tỷ lệ bao phủ nợ xấu (dự phòng trên nợ xấu) của {t} trong {q}/{y}?"),
				format!("Cơ cấu dư nợ cho vay theo nhóm nợ của {t} trong {q}/{y} được thuyết minh ra sao?"),
				format!("Lợi nhuận trước thuế của {t} trong {q}/{y} hoàn thành bao nhiêu phần trăm kế hoạch năm?"),
			],
			Industry::RealEstate => vec![
				format!("Hàng tồn kho của {t} tại {q}/{y} là bao nhiêu, dự án nào chiếm tỷ trọng lớn?"),
				format!("Chi phí sản xuất kinh doanh dở dang của {t} trong {q}/{y} tập trung ở dự án nào?"),
				format!("Người mua trả tiền trước của {t} trong {q}/{y} là bao nhiêu?"),
				format!("Vay và nợ thuê tài chính ngắn hạn và dài hạn của {t} trong {q}/{y} là bao nhiêu?"),
				format!("Tỷ lệ nợ vay trên vốn chủ sở hữu của {t} trong {q}/{y} ở mức nào?"),
				format!("Doanh thu thuần về bán hàng và cung cấp dịch vụ của {t} trong {q}/{y}?"),
				format!("Lợi nhuận gộp và biên lợi nhuận gộp của {t} trong {q}/{y}?"),
				format!("Lưu chuyển tiền thuần từ hoạt động đầu tư của {t} trong {q}/{y} là bao nhiêu?"),
				format!("Tiền và các khoản tương đương tiền cuối kỳ của {t} trong {q}/{y} còn bao nhiêu?"),
			],
			Industry::General => vec![
				format!("Doanh thu thuần của {t} trong {q}/{y} tăng hay giảm so với cùng kỳ?"),
				format!("Giá vốn hàng bán và lợi nhuận gộp của {t} trong {q}/{y}?"),
				format!(
					"Chi phí bán hàng và chi phí quản lý doanh nghiệp của {t} trong {q}/{y} chiếm bao nhiêu phần trăm doanh thu?"
				),
				format!("Chi phí tài chính, trong đó chi phí lãi vay, của {t} trong {q}/{y} là bao nhiêu?"),
				format!("Phải thu ngắn hạn của khách hàng của {t} trong {q}/{y} là bao nhiêu?"),
				format!("Hàng tồn kho của {t} trong {q}/{y} biến động thế nào?"),
				format!("Vay và nợ thuê tài chính ngắn hạn và dài hạn của {t} trong {q}/{y} là bao nhiêu?"),
				format!("Lãi cơ bản trên cổ phiếu của {t} trong {q}/{y} là bao nhiêu?"),
				format!("Chi phí xây dựng cơ bản dở dang của {t} trong {q}/{y} có khoản nào lớn không?"),
			],
		};

		questions.extend(specific);

		Self { industry, questions }
	}

	pub fn len(&self) -> usize {
		self.questions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.questions.is_empty()
	}
}
