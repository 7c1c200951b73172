//! Free-text prompt.

use async_trait::async_trait;

use crate::domain::foundation::DialogError;
use crate::ports::TurnContext;

use super::prompt::{Prompt, PromptOptions, PromptRecognizer, PromptRecognizerResult};

/// Accepts any non-empty message text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRecognizer;

#[async_trait]
impl PromptRecognizer for TextRecognizer {
    type Value = String;

    fn kind(&self) -> &'static str {
        "text"
    }

    async fn on_recognize(
        &self,
        turn: &dyn TurnContext,
        _options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<String>, DialogError> {
        let activity = turn.activity();
        match activity.text.as_deref() {
            Some(text) if activity.is_message() && !text.is_empty() => {
                Ok(PromptRecognizerResult::success(text.to_string()))
            }
            _ => Ok(PromptRecognizerResult::failed()),
        }
    }
}

pub type TextPrompt = Prompt<TextRecognizer>;

impl Prompt<TextRecognizer> {
    pub fn new(id: impl Into<String>) -> Self {
        Prompt::with_recognizer(id, TextRecognizer)
    }
}
