use bytes::Bytes;
use std::fmt;
use std::ops::Div;
use std::sync::Arc;

use crate::error::Result;
use crate::io::{OpenFile, OpenMode, TextOptions};
use crate::models::PathDetails;
use crate::path::{shell_pattern, FolderPath, PathLike};
use crate::storage::{DownloadStream, StorageBackend};

/// A managed storage folder with path-style conveniences
///
/// Cloning shares the backend, so paths derived from clones address the
/// same folder.
#[derive(Clone)]
pub struct Folder {
    lookup: String,
    project_key: Option<String>,
    ignore_flow: bool,
    backend: Arc<dyn StorageBackend>,
}

impl Folder {
    pub fn new(lookup: impl Into<String>, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            lookup: lookup.into(),
            project_key: None,
            ignore_flow: false,
            backend,
        }
    }

    pub fn with_project_key(mut self, project_key: impl Into<String>) -> Self {
        self.project_key = Some(project_key.into());
        self
    }

    pub fn with_ignore_flow(mut self, ignore_flow: bool) -> Self {
        self.ignore_flow = ignore_flow;
        self
    }

    pub fn lookup(&self) -> &str {
        &self.lookup
    }

    pub fn project_key(&self) -> Option<&str> {
        self.project_key.as_deref()
    }

    pub fn ignore_flow(&self) -> bool {
        self.ignore_flow
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Whether both handles share one backend instance
    pub fn is_same(&self, other: &Folder) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }

    pub fn list_paths_in_partition(&self) -> Result<Vec<String>> {
        let paths = self.backend.list_paths_in_partition()?;
        tracing::debug!(
            "Listed {} paths in {} ({})",
            paths.len(),
            self.lookup,
            self.backend.storage_type()
        );
        Ok(paths)
    }

    pub fn get_path_details(&self, path: &str) -> Result<PathDetails> {
        self.backend.get_path_details(path)
    }

    pub fn get_download_stream(&self, path: &str) -> Result<DownloadStream> {
        tracing::debug!("Downloading {} from {}", path, self.lookup);
        self.backend.get_download_stream(path)
    }

    pub fn upload_data(&self, path: &str, data: Bytes) -> Result<()> {
        tracing::debug!("Uploading {} bytes to {} in {}", data.len(), path, self.lookup);
        self.backend.upload_data(path, data)
    }

    pub fn delete_path(&self, path: &str) -> Result<()> {
        tracing::debug!("Deleting {} from {}", path, self.lookup);
        self.backend.delete_path(path)
    }

    pub fn path(&self, path: impl PathLike) -> FolderPath {
        FolderPath::from_pure(self.clone(), path.to_pure())
    }

    /// Paths from the full listing whose string shell-matches `pattern`.
    /// `*` also crosses `/`, so `*.txt` matches `dir/c.txt`; `**` is just `*`.
    pub fn glob(&self, pattern: &str) -> Result<Vec<FolderPath>> {
        let pattern = shell_pattern(pattern)?;
        Ok(self
            .list_paths_in_partition()?
            .iter()
            .filter(|path| pattern.matches(path))
            .map(|path| self.path(path))
            .collect())
    }

    /// Best-effort existence check: any backend error reads as `false`
    pub fn exists(&self, path: &str) -> bool {
        match self.backend.get_path_details(path) {
            Ok(details) => details.exists,
            Err(e) => {
                tracing::debug!("Treating {} as missing after lookup failure: {}", path, e);
                false
            }
        }
    }

    pub fn open(&self, path: &str, mode: OpenMode, options: TextOptions) -> Result<OpenFile> {
        self.path(path).open(mode, options)
    }
}

impl<P: PathLike> Div<P> for &Folder {
    type Output = FolderPath;

    fn div(self, rhs: P) -> FolderPath {
        self.path(rhs)
    }
}

impl<P: PathLike> Div<P> for Folder {
    type Output = FolderPath;

    fn div(self, rhs: P) -> FolderPath {
        FolderPath::from_pure(self, rhs.to_pure())
    }
}

impl fmt::Debug for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Folder")
            .field("lookup", &self.lookup)
            .field("project_key", &self.project_key)
            .field("ignore_flow", &self.ignore_flow)
            .field("storage", &self.backend.storage_type())
            .finish()
    }
}
