//! DialogManager - runs one turn of a conversation against a root dialog.
//!
//! Each turn:
//! 1. acquires the conversation's dialog state lease
//! 2. continues the active dialog
//! 3. begins the root dialog when the stack was empty
//! 4. persists the new state, or the state it started with if the turn
//!    failed

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::domain::dialogs::{
    Dialog, DialogContext, DialogSet, DialogState, DialogStateAccessor, DialogTurnResult,
    DialogTurnStatus, VersionChangePolicy,
};
use crate::domain::foundation::DialogError;
use crate::ports::{StateStorage, TurnContext, TurnHandler};

/// Hosts a root dialog and the dialogs it calls.
pub struct DialogManager {
    dialogs: DialogSet,
    root_dialog_id: String,
    root_options: Option<Value>,
    version_policy: VersionChangePolicy,
}

impl DialogManager {
    /// Registers `root` as the dialog started for new conversations.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the root dialog has an empty id.
    pub fn new(storage: Arc<dyn StateStorage>, root: impl Into<Dialog>) -> Result<Self, DialogError> {
        let accessor = Arc::new(DialogStateAccessor::new(storage));
        let mut dialogs = DialogSet::new(Some(accessor))?;

        let root = root.into();
        let root_dialog_id = root.id().to_string();
        dialogs.add(root)?;

        Ok(Self {
            dialogs,
            root_dialog_id,
            root_options: None,
            version_policy: VersionChangePolicy::default(),
        })
    }

    /// Registers another top-level dialog the root can begin.
    ///
    /// # Errors
    /// Returns `DuplicateId` if the id is taken.
    pub fn add_dialog(&mut self, dialog: impl Into<Dialog>) -> Result<&mut Self, DialogError> {
        self.dialogs.add(dialog)?;
        Ok(self)
    }

    pub fn with_version_policy(mut self, policy: VersionChangePolicy) -> Self {
        self.version_policy = policy;
        self
    }

    /// Applies the engine section of the loaded configuration.
    pub fn with_engine_config(self, config: &EngineConfig) -> Self {
        self.with_version_policy(config.version_change)
    }

    /// Options passed to the root dialog when it begins.
    pub fn with_root_options(mut self, options: Value) -> Self {
        self.root_options = Some(options);
        self
    }

    pub fn root_dialog_id(&self) -> &str {
        &self.root_dialog_id
    }

    pub fn dialogs(&self) -> &DialogSet {
        &self.dialogs
    }

    pub fn version_policy(&self) -> VersionChangePolicy {
        self.version_policy
    }

    /// Runs one turn and returns how the dialog stack ended it.
    ///
    /// # Errors
    /// Returns the first error raised while loading state, running dialogs
    /// or saving state. A failed turn saves the stack as it was before the
    /// turn, so the next message retries from the same place.
    pub async fn run_turn(&self, turn: Arc<dyn TurnContext>) -> Result<DialogTurnResult, DialogError> {
        let mut lease = self.dialogs.load_state(turn.as_ref()).await?;
        let conversation_id = lease.conversation_id().clone();
        let snapshot = lease.state().clone();

        let outcome = self.drive(Arc::clone(&turn), lease.state_mut()).await;
        if outcome.is_err() {
            *lease.state_mut() = snapshot;
        }
        let persisted = lease.persist().await;

        match (outcome, persisted) {
            (Ok(result), Ok(())) => {
                tracing::info!(
                    conversation_id = %conversation_id,
                    status = ?result.status,
                    "Turn completed"
                );
                Ok(result)
            }
            (Ok(_), Err(e)) => {
                tracing::error!(conversation_id = %conversation_id, error = %e, "Failed to persist dialog state");
                Err(e)
            }
            (Err(e), persisted) => {
                if let Err(save_error) = persisted {
                    tracing::error!(
                        conversation_id = %conversation_id,
                        error = %save_error,
                        "Failed to persist dialog state after a failed turn"
                    );
                }
                tracing::warn!(
                    conversation_id = %conversation_id,
                    code = %e.code(),
                    error = %e,
                    "Turn failed"
                );
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        turn: Arc<dyn TurnContext>,
        state: &mut DialogState,
    ) -> Result<DialogTurnResult, DialogError> {
        let mut dc = DialogContext::new(&self.dialogs, Some(turn), state)?
            .with_version_policy(self.version_policy);

        let result = dc.continue_dialog().await?;
        if result.status != DialogTurnStatus::Empty {
            return Ok(result);
        }

        tracing::debug!(dialog_id = %self.root_dialog_id, "Starting root dialog");
        dc.begin_dialog(&self.root_dialog_id, self.root_options.clone())
            .await
    }
}

#[async_trait]
impl TurnHandler for DialogManager {
    async fn on_turn(&self, turn: Arc<dyn TurnContext>) -> Result<(), DialogError> {
        self.run_turn(turn).await.map(|_| ())
    }
}

impl std::fmt::Debug for DialogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogManager")
            .field("root_dialog_id", &self.root_dialog_id)
            .field("version_policy", &self.version_policy)
            .field("dialogs", &self.dialogs)
            .finish()
    }
}
