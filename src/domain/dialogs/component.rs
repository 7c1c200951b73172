//! Component dialogs: a dialog that runs its own inner dialog set.
//!
//! The inner stack lives inside the container's frame, so from the outside
//! a component is a single frame no matter how deep its children go.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::foundation::DialogError;
use crate::ports::TurnContext;

use super::context::DialogContext;
use super::dialog::{Dialog, DialogReason, DialogTurnResult, DialogTurnStatus};
use super::dialog_set::DialogSet;
use super::state::{DialogInstance, DialogState};
use super::version::VersionFingerprint;

const INNER_STACK_KEY: &str = "dialogs";

/// A dialog composed of child dialogs.
pub struct ComponentDialog {
    id: String,
    dialogs: DialogSet,
    initial_dialog_id: Option<String>,
    properties: BTreeMap<String, String>,
}

impl ComponentDialog {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dialogs: DialogSet::detached(),
            initial_dialog_id: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registers a child dialog. The first child becomes the initial dialog
    /// unless one was set explicitly.
    pub fn add_dialog(&mut self, dialog: impl Into<Dialog>) -> Result<&mut Self, DialogError> {
        let dialog = dialog.into();
        let child_id = dialog.id().to_string();
        self.dialogs.add(dialog)?;
        if self.initial_dialog_id.is_none() {
            self.initial_dialog_id = Some(child_id);
        }
        Ok(self)
    }

    pub fn set_initial_dialog_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.initial_dialog_id = Some(id.into());
        self
    }

    pub fn initial_dialog_id(&self) -> Option<&str> {
        self.initial_dialog_id.as_deref()
    }

    /// Records a field that contributes to the container's version.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn find_dialog(&self, id: &str) -> Option<&Dialog> {
        self.dialogs.find(id)
    }

    pub fn dialogs(&self) -> &DialogSet {
        &self.dialogs
    }

    /// Fingerprint over the children in registration order followed by the
    /// sorted properties. Recomputed on every call.
    pub fn internal_version(&self) -> VersionFingerprint {
        let mut signature = self.dialogs.signature();
        signature.push("properties");
        for (key, value) in &self.properties {
            signature.push_field(key, value);
        }
        signature.finish()
    }

    pub(crate) async fn begin(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        let initial = self.initial_dialog_id.clone().ok_or_else(|| {
            DialogError::InvalidState(format!("component '{}' has no dialogs", self.id))
        })?;

        let mut inner = DialogState::new();
        let result = dc
            .child(&self.dialogs, &mut inner)
            .begin_dialog(&initial, options)
            .await?;

        self.settle(dc, inner, result).await
    }

    pub(crate) async fn continue_dialog(
        &self,
        dc: &mut DialogContext<'_>,
    ) -> Result<DialogTurnResult, DialogError> {
        let mut inner = self.load_inner(self.frame(dc)?)?;
        let result = dc
            .child(&self.dialogs, &mut inner)
            .continue_dialog()
            .await?;

        self.settle(dc, inner, result).await
    }

    /// Something pushed on top of the container ended. The container is not
    /// done, so its inner stack re-prompts and waits.
    pub(crate) async fn resume(
        &self,
        dc: &mut DialogContext<'_>,
        _reason: DialogReason,
        _result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        let parents = dc.ancestry();
        let frame = self.frame(dc)?;
        self.reprompt(Arc::clone(dc.turn()), frame, parents).await?;
        Ok(DialogTurnResult::waiting())
    }

    pub(crate) async fn reprompt(
        &self,
        turn: Arc<dyn TurnContext>,
        instance: &DialogInstance,
        parents: Vec<&DialogSet>,
    ) -> Result<(), DialogError> {
        let mut inner = self.load_inner(instance)?;
        let mut inner_dc =
            DialogContext::new(&self.dialogs, Some(turn), &mut inner)?.with_parents(parents);
        inner_dc.reprompt_dialog().await
    }

    pub(crate) async fn end(
        &self,
        turn: Arc<dyn TurnContext>,
        instance: &DialogInstance,
        reason: DialogReason,
        parents: Vec<&DialogSet>,
    ) -> Result<(), DialogError> {
        let mut inner = self.load_inner(instance)?;
        if !inner.is_empty() {
            tracing::debug!(
                dialog_id = %self.id,
                ?reason,
                depth = inner.depth(),
                "Cancelling component inner stack"
            );
            let mut inner_dc =
                DialogContext::new(&self.dialogs, Some(turn), &mut inner)?.with_parents(parents);
            inner_dc.cancel_all_dialogs().await?;
        }
        Ok(())
    }

    /// Stores the inner stack while it waits, or ends the component with
    /// the inner result.
    async fn settle(
        &self,
        dc: &mut DialogContext<'_>,
        inner: DialogState,
        result: DialogTurnResult,
    ) -> Result<DialogTurnResult, DialogError> {
        let stored = serde_json::to_value(&inner)?;
        match dc.active_dialog_mut() {
            Some(frame) if frame.id == self.id => {
                frame.state.insert(INNER_STACK_KEY.to_string(), stored);
            }
            _ => return Err(self.not_active()),
        }
        if result.status == DialogTurnStatus::Waiting {
            return Ok(DialogTurnResult::waiting());
        }

        tracing::debug!(dialog_id = %self.id, status = ?result.status, "Component finished");
        dc.end_dialog(result.result).await
    }

    fn load_inner(&self, instance: &DialogInstance) -> Result<DialogState, DialogError> {
        Ok(instance.get::<DialogState>(INNER_STACK_KEY)?.unwrap_or_default())
    }

    fn frame<'c>(&self, dc: &'c DialogContext<'_>) -> Result<&'c DialogInstance, DialogError> {
        match dc.active_dialog() {
            Some(frame) if frame.id == self.id => Ok(frame),
            _ => Err(self.not_active()),
        }
    }

    fn not_active(&self) -> DialogError {
        DialogError::InvalidState(format!("component '{}' is not the active dialog", self.id))
    }
}

impl std::fmt::Debug for ComponentDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDialog")
            .field("id", &self.id)
            .field("dialogs", &self.dialogs)
            .field("initial_dialog_id", &self.initial_dialog_id)
            .field("properties", &self.properties)
            .finish()
    }
}
