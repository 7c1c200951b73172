//! State Storage Port - Interface for persisting dialog state.
//!
//! One [`DialogState`] blob per conversation. Implementations do not need to
//! serialize writers themselves: the dialog state accessor admits a single
//! lease per conversation at a time.

use async_trait::async_trait;

use crate::domain::dialogs::DialogState;
use crate::domain::foundation::ConversationId;

/// Errors that can occur during state storage operations
#[derive(Debug, thiserror::Error)]
pub enum StateStorageError {
    #[error("State not found for conversation: {0}")]
    NotFound(ConversationId),

    #[error("Failed to serialize state: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize state: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for persisting and loading dialog state
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Save dialog state for a conversation
    ///
    /// # Errors
    /// Returns `StateStorageError` if save fails
    async fn save_state(
        &self,
        conversation_id: &ConversationId,
        state: &DialogState,
    ) -> Result<(), StateStorageError>;

    /// Load dialog state for a conversation
    ///
    /// # Errors
    /// Returns `StateStorageError::NotFound` if no state exists
    async fn load_state(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<DialogState, StateStorageError>;

    /// Check if state exists for a conversation
    async fn exists(&self, conversation_id: &ConversationId) -> Result<bool, StateStorageError>;

    /// Delete the state for a conversation. Deleting missing state is not an error.
    async fn delete(&self, conversation_id: &ConversationId) -> Result<(), StateStorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_storage_error_not_found() {
        let err = StateStorageError::NotFound(ConversationId::new("conv-1").unwrap());
        assert!(err.to_string().contains("State not found"));
        assert!(err.to_string().contains("conv-1"));
    }

    #[test]
    fn test_state_storage_error_serialization() {
        let err = StateStorageError::SerializationFailed("Invalid YAML".to_string());
        assert!(err.to_string().contains("serialize"));
    }
}
