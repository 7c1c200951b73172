//! The dialog abstraction.
//!
//! Dialogs form a closed set of tagged variants. Waterfalls and containers
//! are engine-owned structs; prompts and custom dialogs plug in through the
//! object-safe [`DialogBehavior`] trait. Dispatch goes through the tag so
//! every frame on the stack looks the same regardless of variant.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::domain::foundation::DialogError;
use crate::ports::TurnContext;

use super::component::ComponentDialog;
use super::context::DialogContext;
use super::dialog_set::DialogSet;
use super::state::DialogInstance;
use super::version::VersionFingerprint;
use super::waterfall::WaterfallDialog;

/// Outcome status of a dialog turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogTurnStatus {
    /// No dialog was active on the stack.
    Empty,
    /// The active dialog consumed the turn and is waiting for input.
    Waiting,
    /// The dialog stack ran to completion.
    Complete,
    /// The stack was cancelled.
    Cancelled,
}

/// Result returned from dialog stack operations.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogTurnResult {
    pub status: DialogTurnStatus,
    pub result: Option<Value>,
}

impl DialogTurnResult {
    pub fn empty() -> Self {
        Self {
            status: DialogTurnStatus::Empty,
            result: None,
        }
    }

    pub fn waiting() -> Self {
        Self {
            status: DialogTurnStatus::Waiting,
            result: None,
        }
    }

    pub fn complete(result: Option<Value>) -> Self {
        Self {
            status: DialogTurnStatus::Complete,
            result,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: DialogTurnStatus::Cancelled,
            result: None,
        }
    }
}

/// Why a dialog is being started, resumed or ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogReason {
    BeginCalled,
    ContinueCalled,
    EndCalled,
    ReplaceCalled,
    CancelCalled,
    NextCalled,
}

/// Tag of a [`Dialog`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogKind {
    Waterfall,
    Prompt,
    Container,
    Custom,
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DialogKind::Waterfall => "waterfall",
            DialogKind::Prompt => "prompt",
            DialogKind::Container => "container",
            DialogKind::Custom => "custom",
        };
        write!(f, "{}", s)
    }
}

/// Behavior of prompt and custom dialogs.
///
/// Only `id` and `begin_dialog` are required. The defaults end the dialog
/// on continue and pass a child's result straight through on resume.
#[async_trait]
pub trait DialogBehavior: Send + Sync {
    fn id(&self) -> &str;

    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError>;

    async fn continue_dialog(
        &self,
        dc: &mut DialogContext<'_>,
    ) -> Result<DialogTurnResult, DialogError> {
        dc.end_dialog(None).await
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        _reason: DialogReason,
        result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        dc.end_dialog(result).await
    }

    async fn reprompt_dialog(
        &self,
        _turn: &dyn TurnContext,
        _instance: &DialogInstance,
    ) -> Result<(), DialogError> {
        Ok(())
    }

    /// Called just before the dialog's frame is popped.
    async fn end_dialog(
        &self,
        _turn: &dyn TurnContext,
        _instance: &DialogInstance,
        _reason: DialogReason,
    ) -> Result<(), DialogError> {
        Ok(())
    }

    /// Extra signature fields for version fingerprinting. Must be pure.
    fn signature_contribution(&self) -> String {
        String::new()
    }
}

/// A dialog registered in a [`DialogSet`](super::DialogSet).
pub enum Dialog {
    Waterfall(WaterfallDialog),
    Prompt(Arc<dyn DialogBehavior>),
    Container(ComponentDialog),
    Custom(Arc<dyn DialogBehavior>),
}

impl Dialog {
    /// Wraps a custom dialog implementation.
    pub fn custom(behavior: impl DialogBehavior + 'static) -> Self {
        Dialog::Custom(Arc::new(behavior))
    }

    pub fn id(&self) -> &str {
        match self {
            Dialog::Waterfall(w) => w.id(),
            Dialog::Prompt(p) => p.id(),
            Dialog::Container(c) => c.id(),
            Dialog::Custom(c) => c.id(),
        }
    }

    pub fn kind(&self) -> DialogKind {
        match self {
            Dialog::Waterfall(_) => DialogKind::Waterfall,
            Dialog::Prompt(_) => DialogKind::Prompt,
            Dialog::Container(_) => DialogKind::Container,
            Dialog::Custom(_) => DialogKind::Custom,
        }
    }

    /// The signature this dialog contributes to its container's version.
    ///
    /// Always starts with the kind tag and id; variants append their own
    /// structural fields.
    pub fn signature_contribution(&self) -> String {
        let extra = match self {
            Dialog::Waterfall(w) => w.signature_contribution(),
            Dialog::Prompt(p) => p.signature_contribution(),
            Dialog::Container(c) => c.internal_version().into_string(),
            Dialog::Custom(c) => c.signature_contribution(),
        };
        format!("{}:{}:{}", self.kind(), self.id(), extra)
    }

    /// Fingerprint of this dialog, recorded on each frame at begin time.
    pub fn version(&self) -> VersionFingerprint {
        VersionFingerprint::of(&self.signature_contribution())
    }

    pub fn begin<'a>(
        &'a self,
        dc: &'a mut DialogContext<'_>,
        options: Option<Value>,
    ) -> BoxFuture<'a, Result<DialogTurnResult, DialogError>> {
        async move {
            match self {
                Dialog::Waterfall(w) => w.begin(dc, options).await,
                Dialog::Prompt(p) | Dialog::Custom(p) => p.begin_dialog(dc, options).await,
                Dialog::Container(c) => c.begin(dc, options).await,
            }
        }
        .boxed()
    }

    pub fn continue_dialog<'a>(
        &'a self,
        dc: &'a mut DialogContext<'_>,
    ) -> BoxFuture<'a, Result<DialogTurnResult, DialogError>> {
        async move {
            match self {
                Dialog::Waterfall(w) => w.continue_dialog(dc).await,
                Dialog::Prompt(p) | Dialog::Custom(p) => p.continue_dialog(dc).await,
                Dialog::Container(c) => c.continue_dialog(dc).await,
            }
        }
        .boxed()
    }

    pub fn resume<'a>(
        &'a self,
        dc: &'a mut DialogContext<'_>,
        reason: DialogReason,
        result: Option<Value>,
    ) -> BoxFuture<'a, Result<DialogTurnResult, DialogError>> {
        async move {
            match self {
                Dialog::Waterfall(w) => w.resume(dc, reason, result).await,
                Dialog::Prompt(p) | Dialog::Custom(p) => p.resume_dialog(dc, reason, result).await,
                Dialog::Container(c) => c.resume(dc, reason, result).await,
            }
        }
        .boxed()
    }

    pub fn reprompt<'a>(
        &'a self,
        turn: Arc<dyn TurnContext>,
        instance: &'a DialogInstance,
    ) -> BoxFuture<'a, Result<(), DialogError>> {
        self.reprompt_within(turn, instance, Vec::new())
    }

    /// Reprompt with the dialog sets enclosing the one this dialog lives in.
    pub(crate) fn reprompt_within<'a>(
        &'a self,
        turn: Arc<dyn TurnContext>,
        instance: &'a DialogInstance,
        parents: Vec<&'a DialogSet>,
    ) -> BoxFuture<'a, Result<(), DialogError>> {
        async move {
            match self {
                Dialog::Waterfall(_) => Ok(()),
                Dialog::Prompt(p) | Dialog::Custom(p) => {
                    p.reprompt_dialog(turn.as_ref(), instance).await
                }
                Dialog::Container(c) => c.reprompt(turn, instance, parents).await,
            }
        }
        .boxed()
    }

    pub fn end<'a>(
        &'a self,
        turn: Arc<dyn TurnContext>,
        instance: &'a DialogInstance,
        reason: DialogReason,
    ) -> BoxFuture<'a, Result<(), DialogError>> {
        self.end_within(turn, instance, reason, Vec::new())
    }

    pub(crate) fn end_within<'a>(
        &'a self,
        turn: Arc<dyn TurnContext>,
        instance: &'a DialogInstance,
        reason: DialogReason,
        parents: Vec<&'a DialogSet>,
    ) -> BoxFuture<'a, Result<(), DialogError>> {
        async move {
            match self {
                Dialog::Waterfall(w) => {
                    w.end(instance, reason);
                    Ok(())
                }
                Dialog::Prompt(p) | Dialog::Custom(p) => {
                    p.end_dialog(turn.as_ref(), instance, reason).await
                }
                Dialog::Container(c) => c.end(turn, instance, reason, parents).await,
            }
        }
        .boxed()
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .finish()
    }
}

impl From<WaterfallDialog> for Dialog {
    fn from(dialog: WaterfallDialog) -> Self {
        Dialog::Waterfall(dialog)
    }
}

impl From<ComponentDialog> for Dialog {
    fn from(dialog: ComponentDialog) -> Self {
        Dialog::Container(dialog)
    }
}
