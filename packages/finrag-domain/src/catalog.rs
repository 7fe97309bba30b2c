//! VN30 ticker aliases and static industry membership.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Ticker → aliases (symbol, legal name, common name), in catalog order.
pub const VN30_ALIASES: &[(&str, &[&str])] = &[
	("ACB", &["ACB", "Á CHÂU"]),
	("BCM", &["BCM", "BECAMEX"]),
	("BID", &["BID", "BIDV", "ĐẦU TƯ VÀ PHÁT TRIỂN"]),
	("CTG", &["CTG", "VIETINBANK", "CÔNG THƯƠNG"]),
	("DGC", &["DGC", "ĐỨC GIANG"]),
	("FPT", &["FPT"]),
	("GAS", &["GAS", "PV GAS"]),
	("GVR", &["GVR", "CAO SU"]),
	("HDB", &["HDB", "HDBANK"]),
	("HPG", &["HPG", "HÒA PHÁT"]),
	("LPB", &["LPB", "LPBANK", "LP BANK", "LỘC PHÁT"]),
	("MBB", &["MBB", "MB BANK", "QUÂN ĐỘI"]),
	("MSN", &["MSN", "MASAN"]),
	("MWG", &["MWG", "THẾ GIỚI DI ĐỘNG"]),
	("PLX", &["PLX", "PETROLIMEX"]),
	("SAB", &["SAB", "SABECO"]),
	("SHB", &["SHB"]),
	("SSB", &["SSB", "SEABANK"]),
	("SSI", &["SSI"]),
	("STB", &["STB", "SACOMBANK"]),
	("TCB", &["TCB", "TECHCOMBANK"]),
	("TPB", &["TPB", "TPBANK", "TIÊN PHONG"]),
	("VCB", &["VCB", "VIETCOMBANK", "NGOẠI THƯƠNG"]),
	("VHM", &["VHM", "VINHOMES"]),
	("VIB", &["VIB"]),
	("VIC", &["VIC", "VINGROUP"]),
	("VJC", &["VJC", "VIETJET"]),
	("VNM", &["VNM", "VINAMILK"]),
	("VPB", &["VPB", "VPBANK"]),
	("VRE", &["VRE", "VINCOM RETAIL"]),
];

pub const BANK_TICKERS: &[&str] = &[
	"ACB", "BID", "CTG", "HDB", "LPB", "MBB", "SHB", "SSB", "STB", "TCB", "TPB", "VCB", "VIB",
	"VPB",
];

pub const REAL_ESTATE_TICKERS: &[&str] = &["BCM", "VHM", "VIC", "VRE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Industry {
	Bank,
	RealEstate,
	General,
}
impl Industry {
	pub fn classify(ticker: &str) -> Self {
		if BANK_TICKERS.contains(&ticker) {
			Self::Bank
		} else if REAL_ESTATE_TICKERS.contains(&ticker) {
			Self::RealEstate
		} else {
			Self::General
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Bank => "BANK",
			Self::RealEstate => "REAL_ESTATE",
			Self::General => "GENERAL",
		}
	}
}
impl fmt::Display for Industry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

pub fn is_known_ticker(ticker: &str) -> bool {
	VN30_ALIASES.iter().any(|(symbol, _)| *symbol == ticker)
}

/// First catalog ticker whose alias occurs in `question`.
///
/// Symbol-like aliases (short ASCII codes) must stand as whole words so that, for example,
/// "SERVICE" does not resolve to VIC; multi-word names match as substrings.
pub fn match_ticker(question: &str) -> Option<&'static str> {
	let haystack = fold(question);

	VN30_ALIASES.iter().find_map(|(ticker, aliases)| {
		aliases.iter().any(|alias| alias_occurs(&haystack, &fold(alias))).then_some(*ticker)
	})
}

/// Catalog rendered one ticker per line for prompts.
pub fn alias_listing() -> String {
	VN30_ALIASES
		.iter()
		.map(|(ticker, aliases)| format!("- {ticker}: {}", aliases.join(", ")))
		.collect::<Vec<_>>()
		.join("\n")
}

fn fold(text: &str) -> String {
	text.nfc().collect::<String>().to_uppercase()
}

fn alias_occurs(haystack: &str, alias: &str) -> bool {
	let symbol_like = alias.len() <= 4 && alias.chars().all(|c| c.is_ascii_alphanumeric());

	if !symbol_like {
		return haystack.contains(alias);
	}

	haystack.match_indices(alias).any(|(start, _)| {
		let before = haystack[..start].chars().next_back();
		let after = haystack[start + alias.len()..].chars().next();

		!before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
	})
}
