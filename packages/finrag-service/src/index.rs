use std::path::{Path, PathBuf};

use tokio::fs;

use finrag_domain::period::ReportRequest;

/// Location of one period-scoped knowledge index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeIndexHandle {
	root: PathBuf,
	request: ReportRequest,
}
impl KnowledgeIndexHandle {
	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn request(&self) -> &ReportRequest {
		&self.request
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIndex {
	pub handle: KnowledgeIndexHandle,
	/// Whether the index root exists on disk. Nothing is created while resolving.
	pub available: bool,
}

/// Maps `(ticker, year, quarter)` to `{root}/{TICKER}/{year}/{Qn}`.
#[derive(Debug, Clone)]
pub struct IndexResolver {
	root: PathBuf,
}
impl IndexResolver {
	pub fn new(root: impl AsRef<Path>) -> Self {
		Self { root: root.as_ref().to_path_buf() }
	}

	pub fn path_for(&self, request: &ReportRequest) -> PathBuf {
		self.root
			.join(request.ticker())
			.join(request.year().to_string())
			.join(request.quarter().as_str())
	}

	pub fn handle_for(&self, request: &ReportRequest) -> KnowledgeIndexHandle {
		KnowledgeIndexHandle { root: self.path_for(request), request: request.clone() }
	}

	pub async fn resolve(&self, request: &ReportRequest) -> ResolvedIndex {
		let handle = self.handle_for(request);
		let available = match fs::metadata(handle.root()).await {
			Ok(meta) => meta.is_dir(),
			Err(err) => {
				if err.kind() != std::io::ErrorKind::NotFound {
					tracing::warn!(
						error = %err,
						path = %handle.root().display(),
						"Failed to inspect knowledge index root."
					);
				}

				false
			},
		};

		ResolvedIndex { handle, available }
	}
}
