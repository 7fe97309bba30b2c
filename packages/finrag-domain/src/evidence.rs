use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Separator placed between kept contexts before synthesis.
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

const NOT_FOUND_MARKERS: &[&str] = &[
	"not available",
	"not found",
	"no data",
	"không tìm thấy",
	"không có thông tin",
	"không có dữ liệu",
	"không có trong báo cáo",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceEntry {
	/// Position of the question in its investigation plan.
	pub index: usize,
	pub question: String,
	pub summary: String,
	pub excerpt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBundle {
	pub entries: Vec<EvidenceEntry>,
}
impl EvidenceBundle {
	pub fn from_entries(mut entries: Vec<EvidenceEntry>) -> Self {
		entries.sort_by_key(|entry| entry.index);

		Self { entries }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Dossier text handed to the report writer.
	pub fn render(&self) -> String {
		let mut out = String::new();

		for entry in &self.entries {
			out.push_str("---\n");
			out.push_str(&format!("QUESTION: {}\n", entry.question));
			out.push_str(&format!("AI SUMMARY: {}\n", entry.summary));
			out.push_str("SOURCE EXCERPT:\n");
			out.push_str(&entry.excerpt);
			out.push('\n');
		}

		out
	}
}

/// Keeps responses longer than `min_chars` characters, in input order, capped at `max_kept`.
pub fn filter_contexts<I>(responses: I, min_chars: usize, max_kept: usize) -> Vec<String>
where
	I: IntoIterator<Item = String>,
{
	responses
		.into_iter()
		.filter(|response| response.chars().count() > min_chars)
		.take(max_kept)
		.collect()
}

pub fn join_contexts(contexts: &[String]) -> String {
	contexts.join(CONTEXT_DELIMITER)
}

/// Whether an answer admits that the figure was not found.
pub fn is_not_found(answer: &str) -> bool {
	let lowered = answer.nfc().collect::<String>().to_lowercase();

	lowered.trim().is_empty() || NOT_FOUND_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// First `max_contexts` contexts joined by newlines, cut to `max_chars` characters.
pub fn excerpt(contexts: &[String], max_contexts: usize, max_chars: usize) -> String {
	let joined =
		contexts.iter().take(max_contexts).map(String::as_str).collect::<Vec<_>>().join("\n");

	if joined.chars().count() <= max_chars {
		return joined;
	}

	let mut cut: String = joined.chars().take(max_chars).collect();

	cut.push_str(" ... (truncated)");

	cut
}
