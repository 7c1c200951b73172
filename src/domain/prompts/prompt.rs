//! The generic prompt dialog.
//!
//! A prompt asks a question, recognizes the reply with its
//! [`PromptRecognizer`], optionally validates it, and re-asks until it gets
//! an acceptable answer. The recognizer fixes the type of the value the
//! prompt returns.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::domain::choices::{Choice, ListStyle};
use crate::domain::dialogs::{
    Dialog, DialogBehavior, DialogContext, DialogInstance, DialogReason, DialogTurnResult,
};
use crate::domain::foundation::{Activity, DialogError, InputHint, StateMachine};
use crate::ports::TurnContext;

const OPTIONS_KEY: &str = "options";
const ATTEMPT_COUNT_KEY: &str = "attemptCount";
const STATUS_KEY: &str = "status";

/// Everything a prompt needs to ask its question.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOptions {
    /// Sent when the prompt starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Activity>,
    /// Sent instead of `prompt` after a failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_prompt: Option<Activity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// Overrides the prompt's own list style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ListStyle>,
    /// Free-form data for validators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Value>,
}

impl PromptOptions {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(Activity::message(prompt)),
            ..Default::default()
        }
    }

    pub fn with_retry_prompt(mut self, retry_prompt: impl Into<String>) -> Self {
        self.retry_prompt = Some(Activity::message(retry_prompt));
        self
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_style(mut self, style: ListStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_validations(mut self, validations: Value) -> Self {
        self.validations = Some(validations);
        self
    }

    /// The activity to send for a first ask or a retry.
    pub fn select_prompt(&self, is_retry: bool) -> Option<&Activity> {
        if is_retry {
            if let Some(retry) = self.retry_prompt.as_ref() {
                return Some(retry);
            }
        }
        self.prompt.as_ref()
    }

    fn expect_input(&mut self) {
        for activity in [self.prompt.as_mut(), self.retry_prompt.as_mut()].into_iter().flatten() {
            activity.input_hint.get_or_insert(InputHint::ExpectingInput);
        }
    }
}

/// Lifecycle of a prompt instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptStatus {
    NotStarted,
    AwaitingInput,
    Ended,
}

impl StateMachine for PromptStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PromptStatus::*;
        matches!(
            (self, target),
            (NotStarted, AwaitingInput) | (AwaitingInput, AwaitingInput) | (AwaitingInput, Ended)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PromptStatus::*;
        match self {
            NotStarted => vec![AwaitingInput],
            AwaitingInput => vec![AwaitingInput, Ended],
            Ended => vec![],
        }
    }
}

/// Outcome of recognizing one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRecognizerResult<T> {
    pub succeeded: bool,
    pub value: Option<T>,
}

impl<T> PromptRecognizerResult<T> {
    pub fn failed() -> Self {
        Self {
            succeeded: false,
            value: None,
        }
    }

    pub fn success(value: T) -> Self {
        Self {
            succeeded: true,
            value: Some(value),
        }
    }
}

/// Renders a prompt and recognizes replies of one value type.
#[async_trait]
pub trait PromptRecognizer: Send + Sync + 'static {
    type Value: Serialize + DeserializeOwned + Clone + Send + Sync + fmt::Debug;

    /// Short name of the prompt kind, part of the dialog signature.
    fn kind(&self) -> &'static str;

    /// Sends the prompt, or the retry prompt when `is_retry` is set.
    async fn on_prompt(
        &self,
        turn: &dyn TurnContext,
        options: &PromptOptions,
        is_retry: bool,
    ) -> Result<(), DialogError> {
        send_prompt(turn, options, is_retry).await
    }

    async fn on_recognize(
        &self,
        turn: &dyn TurnContext,
        options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<Self::Value>, DialogError>;

    /// Structural settings that should change the dialog version.
    fn signature(&self) -> String {
        String::new()
    }
}

/// Sends the selected prompt activity as-is.
pub async fn send_prompt(
    turn: &dyn TurnContext,
    options: &PromptOptions,
    is_retry: bool,
) -> Result<(), DialogError> {
    if let Some(activity) = options.select_prompt(is_retry) {
        turn.send_activity(activity.clone()).await?;
    }
    Ok(())
}

/// What a validator sees about the current attempt.
pub struct PromptValidatorContext<'a, T> {
    recognized: &'a PromptRecognizerResult<T>,
    attempt_count: u32,
    options: &'a PromptOptions,
    activity: &'a Activity,
    outbox: Vec<Activity>,
}

impl<'a, T> PromptValidatorContext<'a, T> {
    pub fn recognized(&self) -> &PromptRecognizerResult<T> {
        self.recognized
    }

    /// Number of replies received so far, including this one.
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn options(&self) -> &PromptOptions {
        self.options
    }

    pub fn activity(&self) -> &Activity {
        self.activity
    }

    /// Queues a message. Anything sent suppresses the retry prompt.
    pub fn send(&mut self, text: impl Into<String>) {
        self.outbox.push(Activity::message(text));
    }
}

/// Decides whether a recognized reply is acceptable.
pub type PromptValidator<T> = Arc<dyn Fn(&mut PromptValidatorContext<'_, T>) -> bool + Send + Sync>;

/// Persisted per-instance prompt state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFrame {
    options: PromptOptions,
    attempt_count: u32,
    status: PromptStatus,
}

impl PromptFrame {
    fn load(instance: &DialogInstance) -> Result<Self, DialogError> {
        serde_json::from_value(Value::Object(instance.state.clone())).map_err(|e| {
            DialogError::InvalidState(format!("prompt '{}' state is unreadable: {}", instance.id, e))
        })
    }

    fn store(&self, instance: &mut DialogInstance) -> Result<(), DialogError> {
        instance.set(OPTIONS_KEY, &self.options)?;
        instance.set(ATTEMPT_COUNT_KEY, &self.attempt_count)?;
        instance.set(STATUS_KEY, &self.status)?;
        Ok(())
    }

    fn advance(&mut self, target: PromptStatus) -> Result<(), DialogError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|e| DialogError::InvalidState(e.to_string()))?;
        Ok(())
    }
}

/// A dialog that asks for and returns a single typed value.
pub struct Prompt<R: PromptRecognizer> {
    id: String,
    recognizer: R,
    validator: Option<PromptValidator<R::Value>>,
}

impl<R: PromptRecognizer> Prompt<R> {
    pub fn with_recognizer(id: impl Into<String>, recognizer: R) -> Self {
        Self {
            id: id.into(),
            recognizer,
            validator: None,
        }
    }

    /// Replaces the default "recognized means valid" rule.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&mut PromptValidatorContext<'_, R::Value>) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn recognizer_mut(&mut self) -> &mut R {
        &mut self.recognizer
    }

    /// Sends the prompt for this turn.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when `turn` or `options` is `None`.
    pub async fn on_prompt(
        &self,
        turn: Option<&dyn TurnContext>,
        options: Option<&PromptOptions>,
        is_retry: bool,
    ) -> Result<(), DialogError> {
        let turn = turn.ok_or_else(|| DialogError::missing_argument("turn_context"))?;
        let options = options.ok_or_else(|| DialogError::missing_argument("options"))?;
        self.recognizer.on_prompt(turn, options, is_retry).await
    }

    /// Recognizes the reply in this turn.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when `turn` or `options` is `None`.
    pub async fn on_recognize(
        &self,
        turn: Option<&dyn TurnContext>,
        options: Option<&PromptOptions>,
    ) -> Result<PromptRecognizerResult<R::Value>, DialogError> {
        let turn = turn.ok_or_else(|| DialogError::missing_argument("turn_context"))?;
        let options = options.ok_or_else(|| DialogError::missing_argument("options"))?;
        self.recognizer.on_recognize(turn, options).await
    }

    fn own_frame<'c>(&self, dc: &'c mut DialogContext<'_>) -> Result<&'c mut DialogInstance, DialogError> {
        match dc.active_dialog_mut() {
            Some(frame) if frame.id == self.id => Ok(frame),
            Some(frame) => Err(DialogError::InvalidState(format!(
                "prompt '{}' is not the active dialog ('{}' is)",
                self.id, frame.id
            ))),
            None => Err(DialogError::missing_argument("dialog_state")),
        }
    }
}

#[async_trait]
impl<R: PromptRecognizer> DialogBehavior for Prompt<R> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        let options = options.ok_or_else(|| DialogError::missing_argument("options"))?;
        let mut options: PromptOptions = serde_json::from_value(options).map_err(|e| {
            DialogError::invalid_argument("options", format!("not valid prompt options: {}", e))
        })?;
        options.expect_input();

        let mut frame = PromptFrame {
            options,
            attempt_count: 0,
            status: PromptStatus::NotStarted,
        };
        frame.advance(PromptStatus::AwaitingInput)?;
        frame.store(self.own_frame(dc)?)?;

        tracing::debug!(dialog_id = %self.id, kind = self.recognizer.kind(), "Prompting");
        let turn = Arc::clone(dc.turn());
        self.on_prompt(Some(turn.as_ref()), Some(&frame.options), false)
            .await?;
        Ok(DialogTurnResult::waiting())
    }

    async fn continue_dialog(
        &self,
        dc: &mut DialogContext<'_>,
    ) -> Result<DialogTurnResult, DialogError> {
        let mut frame = PromptFrame::load(self.own_frame(dc)?)?;
        if !dc.activity().is_message() {
            return Ok(DialogTurnResult::waiting());
        }

        let turn = Arc::clone(dc.turn());
        let recognized = self
            .on_recognize(Some(turn.as_ref()), Some(&frame.options))
            .await?;
        frame.attempt_count += 1;

        let is_valid = match &self.validator {
            Some(validator) => {
                let mut context = PromptValidatorContext {
                    recognized: &recognized,
                    attempt_count: frame.attempt_count,
                    options: &frame.options,
                    activity: turn.activity(),
                    outbox: Vec::new(),
                };
                let valid = validator(&mut context);
                for activity in context.outbox {
                    turn.send_activity(activity).await?;
                }
                valid
            }
            None => recognized.succeeded,
        };

        if is_valid {
            frame.advance(PromptStatus::Ended)?;
            frame.store(self.own_frame(dc)?)?;
            tracing::debug!(dialog_id = %self.id, attempts = frame.attempt_count, "Prompt answered");
            let value = recognized.value.map(serde_json::to_value).transpose()?;
            return dc.end_dialog(value).await;
        }

        frame.advance(PromptStatus::AwaitingInput)?;
        frame.store(self.own_frame(dc)?)?;
        tracing::debug!(dialog_id = %self.id, attempts = frame.attempt_count, "Prompt reply rejected");
        if !turn.responded() {
            self.on_prompt(Some(turn.as_ref()), Some(&frame.options), true)
                .await?;
        }
        Ok(DialogTurnResult::waiting())
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        _reason: DialogReason,
        _result: Option<Value>,
    ) -> Result<DialogTurnResult, DialogError> {
        let turn = Arc::clone(dc.turn());
        let frame = self.own_frame(dc)?;
        self.reprompt_dialog(turn.as_ref(), frame).await?;
        Ok(DialogTurnResult::waiting())
    }

    async fn reprompt_dialog(
        &self,
        turn: &dyn TurnContext,
        instance: &DialogInstance,
    ) -> Result<(), DialogError> {
        let frame = PromptFrame::load(instance)?;
        self.on_prompt(Some(turn), Some(&frame.options), false).await
    }

    fn signature_contribution(&self) -> String {
        format!(
            "{}:{}:validator={}",
            self.recognizer.kind(),
            self.recognizer.signature(),
            self.validator.is_some()
        )
    }
}

impl<R: PromptRecognizer> From<Prompt<R>> for Dialog {
    fn from(prompt: Prompt<R>) -> Self {
        Dialog::Prompt(Arc::new(prompt))
    }
}

impl<R: PromptRecognizer + fmt::Debug> fmt::Debug for Prompt<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prompt")
            .field("id", &self.id)
            .field("recognizer", &self.recognizer)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}
