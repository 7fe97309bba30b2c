use std::{
	io::ErrorKind,
	path::{Path, PathBuf},
	process,
	time::{SystemTime, UNIX_EPOCH},
};

use tokio::fs;

use crate::Result;
use finrag_domain::period::ReportRequest;

/// Write-once report cache at `{root}/{TICKER}/{year}/{Qn}.{ext}`.
///
/// A stored report is never rewritten by the pipeline; callers check [`ReportStore::load`]
/// before generating.
#[derive(Debug, Clone)]
pub struct ReportStore {
	root: PathBuf,
	extension: String,
}
impl ReportStore {
	pub fn new(root: impl AsRef<Path>, extension: &str) -> Self {
		Self {
			root: root.as_ref().to_path_buf(),
			extension: extension.trim_start_matches('.').to_string(),
		}
	}

	pub fn path_for(&self, request: &ReportRequest) -> PathBuf {
		self.root
			.join(request.ticker())
			.join(request.year().to_string())
			.join(format!("{}.{}", request.quarter().as_str(), self.extension))
	}

	pub async fn load(&self, request: &ReportRequest) -> Result<Option<String>> {
		match fs::read_to_string(self.path_for(request)).await {
			Ok(content) => Ok(Some(content)),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	/// Writes through a sibling temp file and a rename, so readers never see a partial report.
	pub async fn store(&self, request: &ReportRequest, content: &str) -> Result<PathBuf> {
		let path = self.path_for(request);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).await?;
		}

		let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
		let tmp = path.with_extension(format!("{}.tmp-{}-{nanos}", self.extension, process::id()));

		if let Err(err) = fs::write(&tmp, content).await {
			let _ = fs::remove_file(&tmp).await;

			return Err(err.into());
		}
		if let Err(err) = fs::rename(&tmp, &path).await {
			let _ = fs::remove_file(&tmp).await;

			return Err(err.into());
		}

		Ok(path)
	}
}
