pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read finrag service config {path:?}.")]
	Read { path: std::path::PathBuf, source: std::io::Error },
	#[error("Service config {path:?} is not valid TOML for finrag.")]
	Parse { path: std::path::PathBuf, source: toml::de::Error },
	#[error("Invalid finrag setting: {key} {reason}")]
	Invalid { key: String, reason: String },
}
