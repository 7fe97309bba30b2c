use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Month};

/// Ticker used when neither the catalog nor the router can identify a company.
pub const DEFAULT_TICKER: &str = "DEFAULT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quarter {
	Q1,
	Q2,
	Q3,
	Q4,
}
impl Quarter {
	pub fn from_month(month: Month) -> Self {
		match u8::from(month) {
			1..=3 => Self::Q1,
			4..=6 => Self::Q2,
			7..=9 => Self::Q3,
			_ => Self::Q4,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Q1 => "Q1",
			Self::Q2 => "Q2",
			Self::Q3 => "Q3",
			Self::Q4 => "Q4",
		}
	}

	pub fn number(self) -> u8 {
		match self {
			Self::Q1 => 1,
			Self::Q2 => 2,
			Self::Q3 => 3,
			Self::Q4 => 4,
		}
	}
}
impl fmt::Display for Quarter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for Quarter {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let trimmed = raw.trim().to_uppercase();
		let digits = trimmed.strip_prefix('Q').unwrap_or(&trimmed);

		match digits {
			"1" => Ok(Self::Q1),
			"2" => Ok(Self::Q2),
			"3" => Ok(Self::Q3),
			"4" => Ok(Self::Q4),
			_ => Err(format!("Unknown quarter: {raw:?}.")),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
	pub year: i32,
	pub quarter: Quarter,
}
impl Period {
	pub fn new(year: i32, quarter: Quarter) -> Self {
		Self { year, quarter }
	}

	/// The quarter `date` falls in.
	pub fn containing(date: Date) -> Self {
		Self { year: date.year(), quarter: Quarter::from_month(date.month()) }
	}

	/// The most recent quarter that has fully ended before `date`.
	pub fn last_completed(date: Date) -> Self {
		let current = Self::containing(date);

		match current.quarter {
			Quarter::Q1 => Self { year: current.year - 1, quarter: Quarter::Q4 },
			Quarter::Q2 => Self { year: current.year, quarter: Quarter::Q1 },
			Quarter::Q3 => Self { year: current.year, quarter: Quarter::Q2 },
			Quarter::Q4 => Self { year: current.year, quarter: Quarter::Q3 },
		}
	}
}
impl fmt::Display for Period {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.quarter, self.year)
	}
}

/// Subject and reporting period of a request. Fields are private so the ticker stays normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportRequest {
	ticker: String,
	period: Period,
}
impl ReportRequest {
	pub fn new(ticker: &str, year: i32, quarter: Quarter) -> Self {
		Self { ticker: normalize_ticker(ticker), period: Period::new(year, quarter) }
	}

	pub fn for_period(ticker: &str, period: Period) -> Self {
		Self { ticker: normalize_ticker(ticker), period }
	}

	/// Total-failure route: the default ticker in the quarter containing `today`.
	pub fn sentinel(today: Date) -> Self {
		Self { ticker: DEFAULT_TICKER.to_string(), period: Period::containing(today) }
	}

	pub fn ticker(&self) -> &str {
		&self.ticker
	}

	pub fn year(&self) -> i32 {
		self.period.year
	}

	pub fn quarter(&self) -> Quarter {
		self.period.quarter
	}

	pub fn period(&self) -> Period {
		self.period
	}

	pub fn is_sentinel(&self) -> bool {
		self.ticker == DEFAULT_TICKER
	}
}
impl fmt::Display for ReportRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.ticker, self.period)
	}
}

pub fn normalize_ticker(raw: &str) -> String {
	raw.trim().to_uppercase()
}
