use bytes::Bytes;
use std::io::Read;

use crate::error::Result;
use crate::models::PathDetails;

/// Readable download stream handed out by a backend
pub type DownloadStream = Box<dyn Read + Send>;

/// Storage backend trait
///
/// The managed-folder API a `Folder` wraps. Every call blocks until the
/// backend answers; implementations own their retry and consistency story.
pub trait StorageBackend: Send + Sync {
    /// List every object path in the folder partition
    fn list_paths_in_partition(&self) -> Result<Vec<String>>;

    /// Get metadata for a path
    fn get_path_details(&self, path: &str) -> Result<PathDetails>;

    /// Open a stream over the object content
    fn get_download_stream(&self, path: &str) -> Result<DownloadStream>;

    /// Upload the whole object content, replacing any previous content
    fn upload_data(&self, path: &str, data: Bytes) -> Result<()>;

    /// Delete a path
    fn delete_path(&self, path: &str) -> Result<()>;

    /// Get the storage type name
    fn storage_type(&self) -> &'static str;
}

/// Object key for a path: managed folders address `/a.txt` and `a.txt` alike
pub fn object_key(path: &str) -> &str {
    path.trim_start_matches('/')
}
