pub mod local;
pub mod memory;
pub mod provider;

pub use local::*;
pub use memory::*;
pub use provider::*;

use std::sync::Arc;

use crate::models::{BackendType, LocalStorageConfig};

/// Storage manager that creates backends based on backend type
pub struct StorageManager;

impl StorageManager {
    /// Get a storage backend for the given type
    pub fn get_backend(
        backend_type: BackendType,
        local: &LocalStorageConfig,
    ) -> Arc<dyn StorageBackend> {
        tracing::debug!("Creating {} storage backend", backend_type.as_str());
        match backend_type {
            BackendType::Local => Arc::new(LocalStorage::new(local.clone())),
            BackendType::Memory => Arc::new(MemoryStorage::new()),
        }
    }
}
