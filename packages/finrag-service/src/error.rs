use finrag_domain::period::ReportRequest;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("No data for {ticker} in {quarter}/{year}.")]
	IndexUnavailable { ticker: String, year: i32, quarter: String },
	#[error("No evidence could be gathered for {ticker} in {quarter}/{year}.")]
	EmptyEvidence { ticker: String, year: i32, quarter: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("{operation} timed out after {timeout_ms} ms.")]
	Timeout { operation: &'static str, timeout_ms: u64 },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub fn index_unavailable(request: &ReportRequest) -> Self {
		Self::IndexUnavailable {
			ticker: request.ticker().to_string(),
			year: request.year(),
			quarter: request.quarter().to_string(),
		}
	}

	pub fn empty_evidence(request: &ReportRequest) -> Self {
		Self::EmptyEvidence {
			ticker: request.ticker().to_string(),
			year: request.year(),
			quarter: request.quarter().to_string(),
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
