//! Scoped, single-writer access to persisted dialog state.
//!
//! Each conversation has its own async mutex. A [`DialogStateLease`] holds
//! that mutex for as long as it lives, so two turns of the same conversation
//! can never read-modify-write the stack concurrently. Different
//! conversations never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::{ConversationId, DialogError};
use crate::ports::{StateStorage, StateStorageError};

use super::state::DialogState;

/// Loads and saves [`DialogState`] through the storage port.
pub struct DialogStateAccessor {
    storage: Arc<dyn StateStorage>,
    locks: Mutex<HashMap<ConversationId, Arc<AsyncMutex<()>>>>,
}

impl DialogStateAccessor {
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self {
            storage,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for exclusive access to a conversation and loads its state.
    ///
    /// A conversation with no stored state starts with an empty stack.
    ///
    /// # Errors
    /// Returns `DialogError::Storage` if the storage backend fails for any
    /// reason other than the state being absent.
    pub async fn acquire(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<DialogStateLease, DialogError> {
        let lock = self.lock_for(conversation_id);
        let guard = lock.lock_owned().await;

        let state = match self.storage.load_state(conversation_id).await {
            Ok(state) => state,
            Err(StateStorageError::NotFound(_)) => DialogState::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            conversation_id = %conversation_id,
            depth = state.depth(),
            "Acquired dialog state lease"
        );

        Ok(DialogStateLease {
            conversation_id: conversation_id.clone(),
            state,
            storage: Arc::clone(&self.storage),
            _guard: guard,
        })
    }

    /// Number of conversations with a live lock entry.
    pub fn tracked_conversations(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lock_for(&self, conversation_id: &ConversationId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Entries only referenced by the map have no lease or waiter.
        locks.retain(|id, lock| id == conversation_id || Arc::strong_count(lock) > 1);
        Arc::clone(
            locks
                .entry(conversation_id.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }
}

impl std::fmt::Debug for DialogStateAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogStateAccessor")
            .field("tracked_conversations", &self.tracked_conversations())
            .finish()
    }
}

/// Exclusive access to one conversation's dialog state.
///
/// Call [`persist`](Self::persist) to save and release. Dropping the lease
/// releases it without saving.
pub struct DialogStateLease {
    conversation_id: ConversationId,
    state: DialogState,
    storage: Arc<dyn StateStorage>,
    _guard: OwnedMutexGuard<()>,
}

impl DialogStateLease {
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DialogState {
        &mut self.state
    }

    /// Saves the state and releases the lease.
    pub async fn persist(mut self) -> Result<(), DialogError> {
        self.state.touch();
        self.storage
            .save_state(&self.conversation_id, &self.state)
            .await?;

        tracing::debug!(
            conversation_id = %self.conversation_id,
            depth = self.state.depth(),
            "Persisted dialog state"
        );
        Ok(())
    }
}

impl std::fmt::Debug for DialogStateLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogStateLease")
            .field("conversation_id", &self.conversation_id)
            .field("state", &self.state)
            .finish()
    }
}
