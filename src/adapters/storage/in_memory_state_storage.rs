//! In-Memory State Storage Adapter
//!
//! Stores dialog state in memory.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::dialogs::DialogState;
use crate::domain::foundation::ConversationId;
use crate::ports::{StateStorage, StateStorageError};

/// In-memory storage for dialog state
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStorage {
    states: Arc<RwLock<HashMap<ConversationId, DialogState>>>,
}

impl InMemoryStateStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data (useful for tests)
    pub async fn clear(&self) {
        self.states.write().await.clear();
    }

    /// Get the number of stored states
    pub async fn state_count(&self) -> usize {
        self.states.read().await.len()
    }
}

#[async_trait]
impl StateStorage for InMemoryStateStorage {
    async fn save_state(
        &self,
        conversation_id: &ConversationId,
        state: &DialogState,
    ) -> Result<(), StateStorageError> {
        let mut states = self.states.write().await;
        states.insert(conversation_id.clone(), state.clone());
        Ok(())
    }

    async fn load_state(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<DialogState, StateStorageError> {
        let states = self.states.read().await;
        states
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| StateStorageError::NotFound(conversation_id.clone()))
    }

    async fn exists(&self, conversation_id: &ConversationId) -> Result<bool, StateStorageError> {
        let states = self.states.read().await;
        Ok(states.contains_key(conversation_id))
    }

    async fn delete(&self, conversation_id: &ConversationId) -> Result<(), StateStorageError> {
        self.states.write().await.remove(conversation_id);
        Ok(())
    }
}
