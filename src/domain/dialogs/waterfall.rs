//! Waterfall dialogs: an ordered sequence of steps, one per turn.
//!
//! A step receives the previous step's value through a
//! [`WaterfallStepContext`] and returns a [`StepAction`] telling the engine
//! what to do next. Steps only buffer outgoing messages; the engine sends
//! them once the step returns, before acting on the step's decision.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::domain::foundation::{Activity, DialogError};
use crate::domain::prompts::PromptOptions;

use super::context::DialogContext;
use super::dialog::{DialogReason, DialogTurnResult};
use super::state::DialogInstance;

const OPTIONS_KEY: &str = "options";
const VALUES_KEY: &str = "values";
const REPEAT_KEY: &str = "repeatStep";

/// What a waterfall step wants the engine to do after it returns.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// End the turn; the next user message resumes at the following step.
    EndOfTurn,
    /// Run the following step immediately with this value.
    Next(Option<Value>),
    /// Push a child dialog; its result feeds the following step.
    BeginDialog {
        dialog_id: String,
        options: Option<Value>,
    },
    /// Push a prompt; its recognized value feeds the following step.
    Prompt {
        dialog_id: String,
        options: PromptOptions,
    },
    /// End the waterfall with this value.
    EndDialog(Option<Value>),
    /// End the waterfall and start another dialog in its place.
    ReplaceDialog {
        dialog_id: String,
        options: Option<Value>,
    },
    /// End the turn and run this same step again on the next message.
    RepeatStep,
}

impl StepAction {
    pub fn next(value: impl Into<Value>) -> Self {
        StepAction::Next(Some(value.into()))
    }

    pub fn end(value: impl Into<Value>) -> Self {
        StepAction::EndDialog(Some(value.into()))
    }

    pub fn begin(dialog_id: impl Into<String>, options: Option<Value>) -> Self {
        StepAction::BeginDialog {
            dialog_id: dialog_id.into(),
            options,
        }
    }

    pub fn prompt(dialog_id: impl Into<String>, options: PromptOptions) -> Self {
        StepAction::Prompt {
            dialog_id: dialog_id.into(),
            options,
        }
    }

    pub fn replace(dialog_id: impl Into<String>, options: Option<Value>) -> Self {
        StepAction::ReplaceDialog {
            dialog_id: dialog_id.into(),
            options,
        }
    }
}

/// Everything a step can see and touch while it runs.
#[derive(Debug)]
pub struct WaterfallStepContext {
    index: usize,
    reason: DialogReason,
    result: Option<Value>,
    options: Option<Value>,
    values: Map<String, Value>,
    activity: Activity,
    outbox: Vec<Activity>,
}

impl WaterfallStepContext {
    /// Zero-based position of the running step.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reason(&self) -> DialogReason {
        self.reason
    }

    /// Value produced by the previous step, child dialog or user turn.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// The result as a string, when it is one.
    pub fn result_str(&self) -> Option<&str> {
        self.result.as_ref().and_then(Value::as_str)
    }

    /// Options the waterfall was begun with.
    pub fn options(&self) -> Option<&Value> {
        self.options.as_ref()
    }

    /// Values bag shared by all steps of this waterfall instance.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.values
    }

    /// The inbound activity of the current turn.
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Queues a text message for sending when the step returns.
    pub fn send(&mut self, text: impl Into<String>) {
        self.outbox.push(Activity::message(text));
    }

    pub fn send_activity(&mut self, activity: Activity) {
        self.outbox.push(activity);
    }
}

/// One step of a waterfall.
#[async_trait]
pub trait WaterfallStep: Send + Sync {
    async fn run(&self, step: &mut WaterfallStepContext) -> Result<StepAction, DialogError>;
}

/// Adapts a synchronous closure into a step.
struct FnStep<F>(F);

#[async_trait]
impl<F> WaterfallStep for FnStep<F>
where
    F: Fn(&mut WaterfallStepContext) -> Result<StepAction, DialogError> + Send + Sync,
{
    async fn run(&self, step: &mut WaterfallStepContext) -> Result<StepAction, DialogError> {
        (self.0)(step)
    }
}

/// A dialog that runs its steps in order, one per turn.
pub struct WaterfallDialog {
    id: String,
    steps: Vec<Arc<dyn WaterfallStep>>,
}

impl WaterfallDialog {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a closure step.
    pub fn step<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut WaterfallStepContext) -> Result<StepAction, DialogError> + Send + Sync + 'static,
    {
        self.steps.push(Arc::new(FnStep(f)));
        self
    }

    /// Appends an async step implementation.
    pub fn add_step(mut self, step: impl WaterfallStep + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub(crate) fn signature_contribution(&self) -> String {
        format!("steps={}", self.steps.len())
    }

    pub(crate) async fn begin(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        let frame = self.frame_mut(dc)?;
        frame.state.insert(OPTIONS_KEY.to_string(), options.unwrap_or(Value::Null));
        frame.state.insert(VALUES_KEY.to_string(), Value::Object(Map::new()));

        self.run_step(dc, 0, DialogReason::BeginCalled, None).await
    }

    pub(crate) async fn continue_dialog(
        &self,
        dc: &mut DialogContext<'_>,
    ) -> Result<DialogTurnResult, DialogError> {
        if !dc.activity().is_message() {
            return Ok(DialogTurnResult::waiting());
        }
        let text = Value::String(dc.activity().text_or_empty().to_string());

        let frame = self.frame_mut(dc)?;
        let repeat = frame.state.remove(REPEAT_KEY).is_some();
        let index = match (frame.step_index, repeat) {
            (Some(i), true) => i,
            (Some(i), false) => i + 1,
            (None, _) => 0,
        };

        self.run_step(dc, index, DialogReason::ContinueCalled, Some(text))
            .await
    }

    pub(crate) async fn resume(
        &self,
        dc: &mut DialogContext<'_>,
        reason: DialogReason,
        result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        let frame = self.frame_mut(dc)?;
        let index = frame.step_index.map_or(0, |i| i + 1);
        self.run_step(dc, index, reason, result).await
    }

    pub(crate) fn end(&self, instance: &DialogInstance, reason: DialogReason) {
        tracing::debug!(
            dialog_id = %self.id,
            step = ?instance.step_index,
            ?reason,
            "Waterfall ended"
        );
    }

    /// Runs steps from `index` on. If the turn fails while this waterfall is
    /// still active, the first step is armed to run again on the next turn.
    async fn run_step(
        &self,
        dc: &mut DialogContext<'_>,
        index: usize,
        reason: DialogReason,
        result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        let outcome = self.run_steps(dc, index, reason, result).await;
        if let Err(e) = &outcome {
            if let Ok(frame) = self.frame_mut(dc) {
                tracing::debug!(dialog_id = %self.id, step = index, error = %e, "Waterfall step failed");
                frame.step_index = Some(index);
                frame.state.insert(REPEAT_KEY.to_string(), Value::Bool(true));
            }
        }
        outcome
    }

    async fn run_steps(
        &self,
        dc: &mut DialogContext<'_>,
        mut index: usize,
        mut reason: DialogReason,
        mut result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        loop {
            if index >= self.steps.len() {
                return dc.end_dialog(result).await;
            }

            let activity = dc.activity().clone();
            let frame = self.frame_mut(dc)?;
            frame.step_index = Some(index);
            let options = frame
                .state
                .get(OPTIONS_KEY)
                .filter(|v| !v.is_null())
                .cloned();
            let values = match frame.state.get(VALUES_KEY) {
                Some(Value::Object(values)) => values.clone(),
                _ => Map::new(),
            };

            let mut step = WaterfallStepContext {
                index,
                reason,
                result: result.take(),
                options,
                values,
                activity,
                outbox: Vec::new(),
            };

            tracing::debug!(dialog_id = %self.id, step = index, ?reason, "Running waterfall step");
            let action = self.steps[index].run(&mut step).await?;

            let WaterfallStepContext { values, outbox, .. } = step;
            self.frame_mut(dc)?
                .state
                .insert(VALUES_KEY.to_string(), Value::Object(values));

            for activity in outbox {
                dc.turn().send_activity(activity).await?;
            }

            match action {
                StepAction::EndOfTurn => return Ok(DialogTurnResult::waiting()),
                StepAction::Next(value) => {
                    index += 1;
                    reason = DialogReason::NextCalled;
                    result = value;
                }
                StepAction::BeginDialog { dialog_id, options } => {
                    return dc.begin_dialog(&dialog_id, options).await;
                }
                StepAction::Prompt { dialog_id, options } => {
                    return dc.prompt(&dialog_id, options).await;
                }
                StepAction::EndDialog(value) => return dc.end_dialog(value).await,
                StepAction::ReplaceDialog { dialog_id, options } => {
                    return dc.replace_dialog(&dialog_id, options).await;
                }
                StepAction::RepeatStep => {
                    self.frame_mut(dc)?
                        .state
                        .insert(REPEAT_KEY.to_string(), Value::Bool(true));
                    return Ok(DialogTurnResult::waiting());
                }
            }
        }
    }

    fn frame_mut<'c>(&self, dc: &'c mut DialogContext<'_>) -> Result<&'c mut DialogInstance, DialogError> {
        match dc.active_dialog_mut() {
            Some(frame) if frame.id == self.id => Ok(frame),
            _ => Err(DialogError::InvalidState(format!(
                "waterfall '{}' is not the active dialog",
                self.id
            ))),
        }
    }
}

impl std::fmt::Debug for WaterfallDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaterfallDialog")
            .field("id", &self.id)
            .field("steps", &self.steps.len())
            .finish()
    }
}
