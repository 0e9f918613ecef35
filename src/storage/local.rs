use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{LocalStorageConfig, PathDetails};
use crate::storage::{object_key, DownloadStream, StorageBackend};

/// Local file system storage backend
///
/// Lays a folder out on disk the way a managed folder keeps it: every object
/// is a file under `base_path`, listed as a `/`-prefixed relative path.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(config: LocalStorageConfig) -> Self {
        Self {
            base_path: PathBuf::from(config.base_path),
        }
    }

    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            base_path: root.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a folder path under `base_path`. `..` components are refused
    /// so no key can reach outside the root.
    fn get_full_path(&self, path: &str) -> Result<PathBuf> {
        let key = object_key(path);
        if key.split(['/', '\\']).any(|part| part == "..") {
            return Err(Error::Storage(format!("Path escapes the folder root: {}", path)));
        }
        Ok(self.base_path.join(key))
    }

    fn folder_path(&self, full_path: &Path) -> String {
        let relative = full_path.strip_prefix(&self.base_path).unwrap_or(full_path);
        format!("/{}", relative.to_string_lossy().replace('\\', "/"))
    }

    /// Recursively collect every file below `dir`
    fn walk_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let metadata = fs::metadata(&path)?;

            if metadata.is_file() {
                files.push(path);
            } else if metadata.is_dir() {
                files.append(&mut Self::walk_dir(&path)?);
            }
        }
        Ok(files)
    }

    fn entry_details(&self, full_path: &Path, metadata: &fs::Metadata) -> PathDetails {
        let display = self.folder_path(full_path);
        let details = if metadata.is_dir() {
            PathDetails::directory(&display, Vec::new())
        } else {
            PathDetails::file(&display, metadata.len())
        };
        match metadata.modified() {
            Ok(modified) => details.with_last_modified(DateTime::<Utc>::from(modified)),
            Err(_) => details,
        }
    }

    /// Remove now-empty directories between `start` and the base path
    fn prune_empty_parents(&self, start: Option<&Path>) {
        let mut current_dir = start.map(Path::to_path_buf);
        while let Some(dir) = current_dir {
            if dir == self.base_path || !dir.starts_with(&self.base_path) {
                break;
            }
            match fs::read_dir(&dir) {
                Ok(mut entries) => {
                    if entries.next().is_some() {
                        break;
                    }
                    let _ = fs::remove_dir(&dir);
                }
                Err(_) => break,
            }
            current_dir = dir.parent().map(Path::to_path_buf);
        }
    }
}

impl StorageBackend for LocalStorage {
    fn list_paths_in_partition(&self) -> Result<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<String> = Self::walk_dir(&self.base_path)?
            .iter()
            .map(|p| self.folder_path(p))
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn get_path_details(&self, path: &str) -> Result<PathDetails> {
        let full_path = self.get_full_path(path)?;
        let metadata = match fs::metadata(&full_path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(PathDetails::missing(&self.folder_path(&full_path)));
            }
            Err(e) => return Err(e.into()),
        };

        let mut details = self.entry_details(&full_path, &metadata);
        if metadata.is_dir() {
            let mut children = Vec::new();
            for entry in fs::read_dir(&full_path)? {
                let entry = entry?;
                children.push(self.entry_details(&entry.path(), &entry.metadata()?));
            }
            children.sort_by(|a, b| a.name.cmp(&b.name));
            details.children = children;
        }
        Ok(details)
    }

    fn get_download_stream(&self, path: &str) -> Result<DownloadStream> {
        let full_path = self.get_full_path(path)?;

        if full_path.is_dir() {
            return Err(Error::Storage(format!("Path is a directory: {}", path)));
        }
        let file = fs::File::open(&full_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::NotFound(format!("File not found: {}", path))
            } else {
                Error::Storage(format!("Failed to read file: {}", e))
            }
        })?;

        tracing::debug!("Opened download stream for {:?}", full_path);
        Ok(Box::new(file))
    }

    fn upload_data(&self, path: &str, data: Bytes) -> Result<()> {
        if object_key(path).is_empty() {
            return Err(Error::Storage("Cannot upload to the folder root".to_string()));
        }
        let full_path = self.get_full_path(path)?;

        // Ensure parent directory exists
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&full_path, &data)?;
        tracing::debug!("Saved {} bytes to {:?}", data.len(), full_path);
        Ok(())
    }

    fn delete_path(&self, path: &str) -> Result<()> {
        let full_path = self.get_full_path(path)?;

        let metadata = match fs::metadata(&full_path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("Path not found: {}", path)));
            }
            Err(e) => return Err(e.into()),
        };

        if full_path == self.base_path {
            // Clearing the root keeps the folder itself
            for entry in fs::read_dir(&full_path)? {
                let entry = entry?.path();
                if entry.is_dir() {
                    fs::remove_dir_all(&entry)?;
                } else {
                    fs::remove_file(&entry)?;
                }
            }
        } else if metadata.is_dir() {
            fs::remove_dir_all(&full_path)?;
        } else {
            fs::remove_file(&full_path)?;
        }
        tracing::debug!("Deleted {:?}", full_path);

        self.prune_empty_parents(full_path.parent());
        Ok(())
    }

    fn storage_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use tempfile::tempdir;

    fn read_all(storage: &LocalStorage, path: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        storage
            .get_download_stream(path)
            .unwrap()
            .read_to_end(&mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn test_upload_creates_parent_dirs() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::with_root(temp_dir.path());

        storage
            .upload_data("/level1/level2/test.txt", Bytes::from_static(b"foo"))
            .unwrap();

        assert!(temp_dir.path().join("level1/level2").is_dir());
        assert_eq!(read_all(&storage, "level1/level2/test.txt"), b"foo");
    }

    #[test]
    fn test_list_paths_is_sorted_and_prefixed() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::with_root(temp_dir.path());
        storage.upload_data("b.csv", Bytes::from_static(b"1")).unwrap();
        storage.upload_data("a.txt", Bytes::from_static(b"2")).unwrap();
        storage.upload_data("dir/c.txt", Bytes::from_static(b"3")).unwrap();

        let actual = storage.list_paths_in_partition().unwrap();

        assert_eq!(actual, vec!["/a.txt", "/b.csv", "/dir/c.txt"]);
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::with_root(temp_dir.path().join("nope"));
        assert!(storage.list_paths_in_partition().unwrap().is_empty());
    }

    #[test]
    fn test_path_details() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::with_root(temp_dir.path());
        storage.upload_data("dir/c.txt", Bytes::from_static(b"abc")).unwrap();

        let file = storage.get_path_details("/dir/c.txt").unwrap();
        assert!(file.exists);
        assert!(!file.directory);
        assert_eq!(file.size, Some(3));
        assert_eq!(file.full_path.as_deref(), Some("/dir/c.txt"));
        assert_eq!(file.mime_type.as_deref(), Some("text/plain"));
        assert!(file.last_modified.is_some());

        let dir = storage.get_path_details("dir").unwrap();
        assert!(dir.exists);
        assert!(dir.directory);
        assert_eq!(dir.children.len(), 1);
        assert_eq!(dir.children[0].name.as_deref(), Some("c.txt"));

        let missing = storage.get_path_details("nope.txt").unwrap();
        assert!(!missing.exists);
        assert!(!missing.directory);
    }

    #[test]
    fn test_download_missing_is_not_found() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::with_root(temp_dir.path());

        let actual = storage.get_download_stream("missing.bin");

        assert!(matches!(actual, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete_prunes_empty_parents() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::with_root(temp_dir.path());
        storage.upload_data("a/b/c.txt", Bytes::from_static(b"x")).unwrap();
        storage.upload_data("a/keep.txt", Bytes::from_static(b"y")).unwrap();

        storage.delete_path("a/b/c.txt").unwrap();

        assert!(!temp_dir.path().join("a/b").exists());
        assert!(temp_dir.path().join("a/keep.txt").exists());
    }

    #[test]
    fn test_delete_directory_and_missing() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::with_root(temp_dir.path());
        storage.upload_data("d/one.txt", Bytes::from_static(b"1")).unwrap();
        storage.upload_data("d/two.txt", Bytes::from_static(b"2")).unwrap();

        storage.delete_path("/d").unwrap();

        assert!(storage.list_paths_in_partition().unwrap().is_empty());
        assert!(matches!(storage.delete_path("/d"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_parent_components_are_refused() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().join("root");
        let storage = LocalStorage::with_root(&root);
        fs::write(temp_dir.path().join("outside.txt"), b"keep").unwrap();

        let upload = storage.upload_data("../escaped.txt", Bytes::from_static(b"x"));
        assert!(matches!(upload, Err(Error::Storage(_))));
        assert!(!temp_dir.path().join("escaped.txt").exists());

        assert!(matches!(
            storage.upload_data("/a/../../escaped.txt", Bytes::from_static(b"x")),
            Err(Error::Storage(_))
        ));
        assert!(matches!(storage.delete_path("../outside.txt"), Err(Error::Storage(_))));
        assert!(matches!(storage.get_download_stream("../outside.txt"), Err(Error::Storage(_))));
        assert!(matches!(storage.get_path_details("../outside.txt"), Err(Error::Storage(_))));
        assert!(temp_dir.path().join("outside.txt").exists());

        storage.upload_data("a..b/c..txt", Bytes::from_static(b"ok")).unwrap();
        assert_eq!(read_all(&storage, "a..b/c..txt"), b"ok");
    }

    #[test]
    fn test_delete_root_keeps_folder() {
        let temp_dir = tempdir().unwrap();
        let storage = LocalStorage::with_root(temp_dir.path());
        storage.upload_data("x/y.txt", Bytes::from_static(b"1")).unwrap();

        storage.delete_path("/").unwrap();

        assert!(temp_dir.path().exists());
        assert!(storage.list_paths_in_partition().unwrap().is_empty());
    }
}
