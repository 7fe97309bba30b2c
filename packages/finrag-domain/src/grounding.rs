//! Numeric provenance checks for synthesized answers.
//!
//! A numeric token is grounded when its value equals the value of some token in the report
//! context. `.` and `,` read as thousands separators where exactly three digits follow and as
//! the decimal mark otherwise, and sign notation is ignored. So `876,226,156`, `876.226.156`
//! and `(876.226.156)` are the same figure while `1,25` and `12,5` are not. The question only
//! contributes the figures of its dates and periods (`31/12/2025`, `Q4/2025`, `năm 2024`).

use std::collections::HashSet;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Fixed refusal returned when the evidence cannot support an answer.
pub const NOT_AVAILABLE_ANSWER: &str = "Data is not available in the report.";

const DERIVATION_PATTERN: &str = r"(?i)\((?:tính từ|computed from)\s+(\(?-?\d+(?:[.,]\d+)*\)?)\s*[-−–]\s*(\(?-?\d+(?:[.,]\d+)*\)?)\s*\)";
const PERIOD_PATTERN: &str = r"(?i)\b(\d{1,2})/(\d{1,2})/(\d{4})\b|\b(?:Q|quý)\s*([1-4])\b|\b(\d{1,2})\s+tháng\b|\btháng\s+(\d{1,2})\b";
const THINKING_PATTERN: &str = r"(?s)<think>.*?</think>";

const PRE_TAX_LABELS: [&str; 2] = ["trước thuế", "profit before tax"];
const TAX_LABELS: [&str; 3] =
	["chi phí thuế thu nhập doanh nghiệp", "chi phí thuế tndn", "income tax expense"];
const POST_TAX_LABELS: [&str; 2] = ["sau thuế", "profit after tax"];
const RETAINED_EARNINGS_LABEL: &str = "chưa phân phối";

/// Digit runs with embedded `.`/`,` separators, in order of appearance.
pub fn numeric_tokens(text: &str) -> Vec<&str> {
	let bytes = text.as_bytes();
	let mut tokens = Vec::new();
	let mut i = 0;

	while i < bytes.len() {
		if !bytes[i].is_ascii_digit() {
			i += 1;

			continue;
		}

		let start = i;

		while i < bytes.len() {
			if bytes[i].is_ascii_digit() {
				i += 1;
			} else if matches!(bytes[i], b'.' | b',')
				&& bytes.get(i + 1).is_some_and(u8::is_ascii_digit)
			{
				i += 1;
			} else {
				break;
			}
		}

		tokens.push(&text[start..i]);
	}

	tokens
}

/// Value of a token as `integer` or `integer.fraction`, without sign or grouping.
///
/// A trailing group that is not three digits long is the fraction; every other separator
/// groups thousands.
pub fn canonical(token: &str) -> String {
	let digits: String =
		token.chars().filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',')).collect();
	let mut groups: Vec<&str> = digits.split(['.', ',']).filter(|g| !g.is_empty()).collect();
	let fraction = if groups.len() > 1 && groups.last().is_some_and(|last| last.len() != 3) {
		groups.pop()
	} else {
		None
	};
	let joined = groups.concat();
	let integer = match joined.trim_start_matches('0') {
		"" => "0",
		trimmed => trimmed,
	};

	match fraction.map(|f| f.trim_end_matches('0')).filter(|f| !f.is_empty()) {
		Some(fraction) => format!("{integer}.{fraction}"),
		None => integer.to_string(),
	}
}

/// Figures of the dates and periods named in `question`.
pub fn period_figures(question: &str) -> Vec<String> {
	let Ok(re) = Regex::new(PERIOD_PATTERN) else {
		return Vec::new();
	};

	re.captures_iter(question)
		.flat_map(|caps| {
			caps.iter().skip(1).flatten().map(|m| canonical(m.as_str())).collect::<Vec<_>>()
		})
		.chain(
			numeric_tokens(question)
				.into_iter()
				.filter(|token| is_year(token))
				.map(str::to_string),
		)
		.collect()
}

/// Answer tokens that cannot be traced to `context` or to the periods of `question`.
///
/// One inline derivation `(tính từ A - B)` / `(computed from A - B)` is honoured only when
/// the context has no post-tax profit line, `A` sits on the pre-tax profit row and `B` on the
/// corporate income tax row. It admits exactly the figure `A - B`. More than one derivation
/// admits nothing.
pub fn ungrounded_numbers(answer: &str, context: &str, question: &str) -> Vec<String> {
	let mut allowed: HashSet<String> = numeric_tokens(context)
		.into_iter()
		.map(canonical)
		.chain(period_figures(question))
		.collect();

	if let Some(derived) = derived_figure(answer, context) {
		allowed.insert(derived);
	}

	numeric_tokens(answer)
		.into_iter()
		.filter(|token| !allowed.contains(&canonical(token)))
		.map(str::to_string)
		.collect()
}

pub fn is_grounded(answer: &str, context: &str, question: &str) -> bool {
	ungrounded_numbers(answer, context, question).is_empty()
}

/// Removes `<think>…</think>` blocks and any dangling preamble ending in `</think>`, keeping
/// the layout of what remains.
pub fn remove_thinking(text: &str) -> String {
	let without_blocks = match Regex::new(THINKING_PATTERN) {
		Ok(re) => re.replace_all(text, "").into_owned(),
		Err(_) => text.to_string(),
	};
	let tail = match without_blocks.rfind("</think>") {
		Some(pos) => &without_blocks[pos + "</think>".len()..],
		None => without_blocks.as_str(),
	};

	tail.trim().to_string()
}

/// [`remove_thinking`], then collapsed into a single line.
pub fn strip_thinking(text: &str) -> String {
	remove_thinking(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn derived_figure(answer: &str, context: &str) -> Option<String> {
	let re = Regex::new(DERIVATION_PATTERN).ok()?;
	let mut captures = re.captures_iter(answer);
	let first = captures.next()?;

	if captures.next().is_some() || reports_post_tax_profit(context) {
		return None;
	}

	let (lhs, rhs) = (first.get(1)?.as_str(), first.get(2)?.as_str());

	if !row_figures(context, &PRE_TAX_LABELS).contains(&canonical(lhs))
		|| !row_figures(context, &TAX_LABELS).contains(&canonical(rhs))
	{
		return None;
	}

	// Tax expense reduces profit whichever way the row prints it.
	let difference = signed_value(lhs)?.checked_sub(signed_value(rhs)?.abs())?;

	Some(difference.unsigned_abs().to_string())
}

fn reports_post_tax_profit(context: &str) -> bool {
	lowered_lines(context).any(|line| {
		POST_TAX_LABELS.iter().any(|label| line.contains(label))
			&& !line.contains(RETAINED_EARNINGS_LABEL)
	})
}

fn row_figures(context: &str, labels: &[&str]) -> HashSet<String> {
	lowered_lines(context)
		.filter(|line| labels.iter().any(|label| line.contains(label)))
		.flat_map(|line| numeric_tokens(&line).into_iter().map(canonical).collect::<Vec<_>>())
		.collect()
}

fn lowered_lines(context: &str) -> impl Iterator<Item = String> + '_ {
	context.lines().map(|line| line.nfc().collect::<String>().to_lowercase())
}

fn is_year(token: &str) -> bool {
	token.len() == 4 && token.parse::<u16>().is_ok_and(|year| (1900..2100).contains(&year))
}

fn signed_value(token: &str) -> Option<i128> {
	let magnitude: i128 = canonical(token).parse().ok()?;
	let negative = token.starts_with('-') || token.starts_with('(');

	Some(if negative { -magnitude } else { magnitude })
}
