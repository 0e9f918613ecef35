use bytes::Bytes;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::models::PathDetails;
use crate::storage::{object_key, DownloadStream, StorageBackend};

struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

/// In-process storage backend
///
/// Objects live in an insertion-ordered map, so listings come back in
/// upload order. Directories are implied by key prefixes.
#[derive(Default)]
pub struct MemoryStorage {
    objects: RwLock<IndexMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a backend pre-populated with `(path, content)` pairs
    pub fn with_objects<I, P, D>(objects: I) -> Self
    where
        I: IntoIterator<Item = (P, D)>,
        P: AsRef<str>,
        D: Into<Bytes>,
    {
        let storage = Self::new();
        {
            let mut map = storage.objects.write();
            for (path, data) in objects {
                map.insert(
                    object_key(path.as_ref()).to_string(),
                    StoredObject {
                        data: data.into(),
                        last_modified: Utc::now(),
                    },
                );
            }
        }
        storage
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    fn dir_prefix(key: &str) -> String {
        if key.is_empty() {
            String::new()
        } else {
            format!("{}/", key)
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn list_paths_in_partition(&self) -> Result<Vec<String>> {
        Ok(self.objects.read().keys().cloned().collect())
    }

    fn get_path_details(&self, path: &str) -> Result<PathDetails> {
        let key = object_key(path);
        let full_path = format!("/{}", key);
        let objects = self.objects.read();

        if let Some(object) = objects.get(key) {
            return Ok(PathDetails::file(&full_path, object.data.len() as u64)
                .with_last_modified(object.last_modified));
        }

        let prefix = Self::dir_prefix(key);
        let mut children: Vec<PathDetails> = Vec::new();
        for (child_key, object) in objects.iter().filter(|(k, _)| k.starts_with(&prefix)) {
            let rest = &child_key[prefix.len()..];
            match rest.split_once('/') {
                Some((dir, _)) => {
                    let dir_path = format!("/{}{}", prefix, dir);
                    if !children.iter().any(|c| c.full_path.as_deref() == Some(dir_path.as_str())) {
                        children.push(PathDetails::directory(&dir_path, Vec::new()));
                    }
                }
                None => children.push(
                    PathDetails::file(&format!("/{}", child_key), object.data.len() as u64)
                        .with_last_modified(object.last_modified),
                ),
            }
        }

        if children.is_empty() && !key.is_empty() {
            return Ok(PathDetails::missing(&full_path));
        }
        Ok(PathDetails::directory(&full_path, children))
    }

    fn get_download_stream(&self, path: &str) -> Result<DownloadStream> {
        let objects = self.objects.read();
        let object = objects
            .get(object_key(path))
            .ok_or_else(|| Error::NotFound(format!("Object not found: {}", path)))?;
        Ok(Box::new(Cursor::new(object.data.clone())))
    }

    fn upload_data(&self, path: &str, data: Bytes) -> Result<()> {
        let key = object_key(path);
        if key.is_empty() {
            return Err(Error::Storage("Cannot upload to the folder root".to_string()));
        }
        tracing::debug!("Stored {} bytes at {}", data.len(), key);
        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                data,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    fn delete_path(&self, path: &str) -> Result<()> {
        let key = object_key(path);
        let mut objects = self.objects.write();

        if objects.shift_remove(key).is_some() {
            return Ok(());
        }

        let prefix = Self::dir_prefix(key);
        let before = objects.len();
        objects.retain(|k, _| !k.starts_with(&prefix));
        if objects.len() == before && !key.is_empty() {
            return Err(Error::NotFound(format!("Path not found: {}", path)));
        }
        Ok(())
    }

    fn storage_type(&self) -> &'static str {
        "memory"
    }
}
