//! Run-time cursor over a conversation's dialog stack.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::foundation::{Activity, DialogError, ValidationError};
use crate::domain::prompts::PromptOptions;
use crate::ports::TurnContext;

use super::dialog::{Dialog, DialogKind, DialogReason, DialogTurnResult};
use super::dialog_set::DialogSet;
use super::state::{DialogInstance, DialogState};

/// What to do when a frame's recorded version differs from the live dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionChangePolicy {
    /// Log a warning and keep running the stack.
    #[default]
    Warn,
    /// Cancel the whole stack and report an empty turn.
    Restart,
    /// Refuse to continue with `DialogError::VersionChanged`.
    Fail,
}

impl fmt::Display for VersionChangePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VersionChangePolicy::Warn => "warn",
            VersionChangePolicy::Restart => "restart",
            VersionChangePolicy::Fail => "fail",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for VersionChangePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(VersionChangePolicy::Warn),
            "restart" => Ok(VersionChangePolicy::Restart),
            "fail" => Ok(VersionChangePolicy::Fail),
            other => Err(ValidationError::invalid_format(
                "version_change",
                format!("unknown policy '{}'", other),
            )),
        }
    }
}

/// Binds a dialog set, a turn and a dialog stack together for one turn.
///
/// All stack mutation goes through this type. Ids not registered in
/// `dialogs` are looked up in the enclosing sets, innermost first.
pub struct DialogContext<'a> {
    dialogs: &'a DialogSet,
    parents: Vec<&'a DialogSet>,
    turn: Arc<dyn TurnContext>,
    state: &'a mut DialogState,
    version_policy: VersionChangePolicy,
}

impl<'a> DialogContext<'a> {
    /// # Errors
    /// Returns `InvalidArgument` when `turn` is `None`.
    pub fn new(
        dialogs: &'a DialogSet,
        turn: Option<Arc<dyn TurnContext>>,
        state: &'a mut DialogState,
    ) -> Result<Self, DialogError> {
        let turn = turn.ok_or_else(|| DialogError::missing_argument("turn_context"))?;
        Ok(Self {
            dialogs,
            parents: Vec::new(),
            turn,
            state,
            version_policy: VersionChangePolicy::default(),
        })
    }

    pub fn with_version_policy(mut self, policy: VersionChangePolicy) -> Self {
        self.version_policy = policy;
        self
    }

    /// Sets the enclosing dialog sets consulted after `dialogs`.
    pub(crate) fn with_parents(mut self, parents: Vec<&'a DialogSet>) -> Self {
        self.parents = parents;
        self
    }

    /// Context over a container's inner stack, sharing this turn.
    pub(crate) fn child<'b>(&self, dialogs: &'b DialogSet, state: &'b mut DialogState) -> DialogContext<'b>
    where
        'a: 'b,
    {
        DialogContext {
            dialogs,
            parents: self.ancestry(),
            turn: Arc::clone(&self.turn),
            state,
            version_policy: self.version_policy,
        }
    }

    /// This context's dialog set followed by its enclosing sets.
    pub(crate) fn ancestry(&self) -> Vec<&'a DialogSet> {
        std::iter::once(self.dialogs)
            .chain(self.parents.iter().copied())
            .collect()
    }

    pub fn turn(&self) -> &Arc<dyn TurnContext> {
        &self.turn
    }

    pub fn activity(&self) -> &Activity {
        self.turn.activity()
    }

    pub fn dialogs(&self) -> &'a DialogSet {
        self.dialogs
    }

    pub fn state(&self) -> &DialogState {
        self.state
    }

    pub fn version_policy(&self) -> VersionChangePolicy {
        self.version_policy
    }

    pub fn stack_depth(&self) -> usize {
        self.state.depth()
    }

    pub fn active_dialog(&self) -> Option<&DialogInstance> {
        self.state.active()
    }

    pub fn active_dialog_mut(&mut self) -> Option<&mut DialogInstance> {
        self.state.active_mut()
    }

    /// Finds a dialog in this context's set or, failing that, an enclosing one.
    pub fn find_dialog(&self, id: &str) -> Option<&'a Dialog> {
        self.dialogs
            .find(id)
            .or_else(|| self.parents.iter().find_map(|set| set.find(id)))
    }

    /// Pushes a new frame for `dialog_id` and starts it.
    ///
    /// If the dialog fails to begin, the stack is put back to its depth
    /// before the call.
    ///
    /// # Errors
    /// - `InvalidArgument` if `dialog_id` is empty
    /// - `DialogNotFound` if no such dialog is registered
    pub async fn begin_dialog(
        &mut self,
        dialog_id: &str,
        options: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        let dialog = self.lookup(dialog_id)?;

        let depth = self.state.depth();
        let mut frame = DialogInstance::new(dialog_id);
        frame.version = Some(dialog.version().into_string());
        self.state.dialog_stack.push(frame);

        tracing::debug!(
            dialog_id = %dialog_id,
            kind = %dialog.kind(),
            depth = self.state.depth(),
            "Beginning dialog"
        );
        let result = dialog.begin(self, options).await;
        if result.is_err() {
            self.state.dialog_stack.truncate(depth);
        }
        result
    }

    /// Begins a prompt dialog with typed options.
    ///
    /// # Errors
    /// As [`begin_dialog`](Self::begin_dialog), plus `InvalidArgument` when
    /// the target is not a prompt.
    pub async fn prompt(
        &mut self,
        dialog_id: &str,
        options: PromptOptions,
    ) -> Result<DialogTurnResult, DialogError> {
        let dialog = self.lookup(dialog_id)?;
        if dialog.kind() != DialogKind::Prompt {
            return Err(DialogError::invalid_argument(
                "dialog_id",
                format!("'{}' is a {} dialog, not a prompt", dialog_id, dialog.kind()),
            ));
        }
        let options = serde_json::to_value(options)?;
        self.begin_dialog(dialog_id, Some(options)).await
    }

    /// Routes the current turn to the active dialog.
    ///
    /// Returns `Empty` when nothing is on the stack.
    pub async fn continue_dialog(&mut self) -> Result<DialogTurnResult, DialogError> {
        let Some(frame) = self.state.active() else {
            return Ok(DialogTurnResult::empty());
        };
        let dialog_id = frame.id.clone();

        if let Some(changed) = self.version_drift() {
            match self.version_policy {
                VersionChangePolicy::Warn => {
                    tracing::warn!(dialog_id = %changed, "Dialog changed since it was started; continuing");
                }
                VersionChangePolicy::Restart => {
                    tracing::warn!(dialog_id = %changed, "Dialog changed since it was started; restarting");
                    self.cancel_all_dialogs().await?;
                    return Ok(DialogTurnResult::empty());
                }
                VersionChangePolicy::Fail => {
                    return Err(DialogError::VersionChanged { dialog_id: changed });
                }
            }
        }

        let dialog = self.lookup(&dialog_id)?;
        tracing::debug!(dialog_id = %dialog_id, "Continuing dialog");
        dialog.continue_dialog(self).await
    }

    /// Ends the active dialog and hands `result` to its parent.
    ///
    /// With no parent left the stack is done and `Complete(result)` is
    /// returned.
    pub async fn end_dialog(&mut self, result: Option<Value>) -> Result<DialogTurnResult, DialogError> {
        self.end_active_dialog(DialogReason::EndCalled).await?;

        let Some(parent) = self.state.active() else {
            return Ok(DialogTurnResult::complete(result));
        };
        let parent_id = parent.id.clone();
        let dialog = self.lookup(&parent_id)?;

        tracing::debug!(dialog_id = %parent_id, "Resuming parent dialog");
        dialog.resume(self, DialogReason::EndCalled, result).await
    }

    /// Ends every dialog on the stack, innermost first.
    pub async fn cancel_all_dialogs(&mut self) -> Result<DialogTurnResult, DialogError> {
        if self.state.is_empty() {
            return Ok(DialogTurnResult::empty());
        }
        while !self.state.is_empty() {
            self.end_active_dialog(DialogReason::CancelCalled).await?;
        }
        tracing::debug!("Cancelled all dialogs");
        Ok(DialogTurnResult::cancelled())
    }

    /// Ends the active dialog without resuming its parent and starts
    /// `dialog_id` in its place.
    pub async fn replace_dialog(
        &mut self,
        dialog_id: &str,
        options: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        self.lookup(dialog_id)?;
        self.end_active_dialog(DialogReason::ReplaceCalled).await?;
        self.begin_dialog(dialog_id, options).await
    }

    /// Asks the active dialog to re-issue its prompt.
    pub async fn reprompt_dialog(&mut self) -> Result<(), DialogError> {
        let Some(frame) = self.state.active() else {
            return Ok(());
        };
        let dialog = self
            .find_dialog(&frame.id)
            .ok_or_else(|| DialogError::DialogNotFound(frame.id.clone()))?;
        dialog
            .reprompt_within(Arc::clone(&self.turn), frame, self.ancestry())
            .await
    }

    async fn end_active_dialog(&mut self, reason: DialogReason) -> Result<(), DialogError> {
        let Some(frame) = self.state.active() else {
            return Ok(());
        };
        match self.find_dialog(&frame.id) {
            Some(dialog) => {
                dialog
                    .end_within(Arc::clone(&self.turn), frame, reason, self.ancestry())
                    .await?
            }
            None => {
                tracing::warn!(dialog_id = %frame.id, "Ending frame of an unregistered dialog");
            }
        }

        if let Some(frame) = self.state.dialog_stack.pop() {
            tracing::debug!(dialog_id = %frame.id, ?reason, "Ended dialog");
        }
        Ok(())
    }

    fn lookup(&self, dialog_id: &str) -> Result<&'a Dialog, DialogError> {
        if dialog_id.trim().is_empty() {
            return Err(DialogError::invalid_argument("dialog_id", "value cannot be empty"));
        }
        self.find_dialog(dialog_id)
            .ok_or_else(|| DialogError::DialogNotFound(dialog_id.to_string()))
    }

    /// Id of the outermost frame whose dialog is gone or whose recorded
    /// version no longer matches.
    fn version_drift(&self) -> Option<String> {
        self.state.dialog_stack.iter().find_map(|frame| {
            let Some(dialog) = self.find_dialog(&frame.id) else {
                return Some(frame.id.clone());
            };
            let recorded = frame.version.as_deref()?;
            (dialog.version().as_str() != recorded).then(|| frame.id.clone())
        })
    }
}

impl fmt::Debug for DialogContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogContext")
            .field("dialogs", &self.dialogs)
            .field("state", &self.state)
            .field("version_policy", &self.version_policy)
            .finish()
    }
}
