//! State storage configuration

use serde::Deserialize;
use std::sync::Arc;

use crate::adapters::storage::{FileStateStorage, InMemoryStateStorage};
use crate::ports::StateStorage;

use super::error::ValidationError;

/// Where dialog state is persisted
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Base directory for the file backend
    pub path: Option<String>,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.backend, self.path.as_deref()) {
            (StorageBackend::File, None) => Err(ValidationError::MissingRequired("storage.path")),
            (_, Some(path)) if path.trim().is_empty() => Err(ValidationError::EmptyStoragePath),
            _ => Ok(()),
        }
    }

    /// Build the configured storage adapter
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the configuration is invalid.
    pub fn build_storage(&self) -> Result<Arc<dyn StateStorage>, ValidationError> {
        self.validate()?;
        let storage: Arc<dyn StateStorage> = match (self.backend, self.path.as_deref()) {
            (StorageBackend::File, Some(path)) => Arc::new(FileStateStorage::new(path)),
            (StorageBackend::File, None) => {
                return Err(ValidationError::MissingRequired("storage.path"));
            }
            (StorageBackend::Memory, _) => Arc::new(InMemoryStateStorage::new()),
        };
        tracing::debug!(backend = ?self.backend, "Built dialog state storage");
        Ok(storage)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: None,
        }
    }
}
