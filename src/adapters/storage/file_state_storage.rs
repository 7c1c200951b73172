//! File-based State Storage Adapter
//!
//! Stores dialog state as YAML files on disk, one directory per
//! conversation: `<base>/<conversation>/state.yaml`.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::dialogs::DialogState;
use crate::domain::foundation::ConversationId;
use crate::ports::{StateStorage, StateStorageError};

const STATE_FILE: &str = "state.yaml";

/// File-based storage for dialog state
#[derive(Debug, Clone)]
pub struct FileStateStorage {
    base_path: PathBuf,
}

impl FileStateStorage {
    /// Create a new file storage with a base directory
    ///
    /// # Example
    /// ```ignore
    /// let storage = FileStateStorage::new("./data/dialogs");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory for one conversation.
    ///
    /// Ids made only of `[A-Za-z0-9._-]` are used verbatim; anything else is
    /// replaced by its SHA-256 so channel ids can never escape `base_path`.
    fn conversation_dir(&self, conversation_id: &ConversationId) -> PathBuf {
        let raw = conversation_id.as_str();
        let safe = !raw.starts_with('.')
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if safe {
            self.base_path.join(raw)
        } else {
            let digest = Sha256::digest(raw.as_bytes());
            self.base_path.join(format!("sha256-{:x}", digest))
        }
    }

    fn state_file_path(&self, conversation_id: &ConversationId) -> PathBuf {
        self.conversation_dir(conversation_id).join(STATE_FILE)
    }

    async fn ensure_dir(&self, path: &Path) -> Result<(), StateStorageError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| StateStorageError::IoError(e.to_string()))
    }
}

#[async_trait]
impl StateStorage for FileStateStorage {
    async fn save_state(
        &self,
        conversation_id: &ConversationId,
        state: &DialogState,
    ) -> Result<(), StateStorageError> {
        let dir = self.conversation_dir(conversation_id);
        self.ensure_dir(&dir).await?;

        let yaml = serde_yaml::to_string(state)
            .map_err(|e| StateStorageError::SerializationFailed(e.to_string()))?;

        fs::write(dir.join(STATE_FILE), yaml)
            .await
            .map_err(|e| StateStorageError::IoError(e.to_string()))?;

        tracing::trace!(conversation_id = %conversation_id, "Dialog state written");
        Ok(())
    }

    async fn load_state(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<DialogState, StateStorageError> {
        let file_path = self.state_file_path(conversation_id);

        let yaml = match fs::read_to_string(&file_path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StateStorageError::NotFound(conversation_id.clone()));
            }
            Err(e) => return Err(StateStorageError::IoError(e.to_string())),
        };

        serde_yaml::from_str(&yaml)
            .map_err(|e| StateStorageError::DeserializationFailed(e.to_string()))
    }

    async fn exists(&self, conversation_id: &ConversationId) -> Result<bool, StateStorageError> {
        fs::try_exists(self.state_file_path(conversation_id))
            .await
            .map_err(|e| StateStorageError::IoError(e.to_string()))
    }

    async fn delete(&self, conversation_id: &ConversationId) -> Result<(), StateStorageError> {
        match fs::remove_dir_all(self.conversation_dir(conversation_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateStorageError::IoError(e.to_string())),
        }
    }
}
