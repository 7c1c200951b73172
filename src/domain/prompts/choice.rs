//! Prompt that asks the user to pick from a list of choices.

use async_trait::async_trait;

use crate::domain::choices::{
    culture_for, recognize_choices, ChoiceFactory, ChoiceFactoryOptions, FindChoicesOptions,
    FoundChoice, ListStyle, PromptCulture,
};
use crate::domain::foundation::{Activity, DialogError};
use crate::ports::TurnContext;

use super::prompt::{Prompt, PromptOptions, PromptRecognizer, PromptRecognizerResult};

/// Renders `PromptOptions::choices` and resolves the reply to one of them.
#[derive(Debug, Clone, Default)]
pub struct ChoiceRecognizer {
    default_locale: Option<String>,
    style: ListStyle,
    choice_options: Option<ChoiceFactoryOptions>,
    recognizer_options: FindChoicesOptions,
}

impl ChoiceRecognizer {
    fn culture(&self, activity: &Activity) -> &'static PromptCulture {
        culture_for(activity.locale.as_deref().or(self.default_locale.as_deref()))
    }
}

#[async_trait]
impl PromptRecognizer for ChoiceRecognizer {
    type Value = FoundChoice;

    fn kind(&self) -> &'static str {
        "choice"
    }

    async fn on_prompt(
        &self,
        turn: &dyn TurnContext,
        options: &PromptOptions,
        is_retry: bool,
    ) -> Result<(), DialogError> {
        let factory_options = match &self.choice_options {
            Some(custom) => custom.clone(),
            None => ChoiceFactoryOptions::for_culture(self.culture(turn.activity())),
        };
        let base = options
            .select_prompt(is_retry)
            .cloned()
            .unwrap_or_else(|| Activity::message(""));
        let style = options.style.unwrap_or(self.style);

        let activity = ChoiceFactory::append_choices(&base, &options.choices, style, &factory_options);
        turn.send_activity(activity).await
    }

    async fn on_recognize(
        &self,
        turn: &dyn TurnContext,
        options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<FoundChoice>, DialogError> {
        let activity = turn.activity();
        let utterance = activity.text_or_empty();
        if !activity.is_message() || utterance.trim().is_empty() {
            return Ok(PromptRecognizerResult::failed());
        }

        let found = recognize_choices(utterance, &options.choices, &self.recognizer_options);
        Ok(match found.into_iter().next() {
            Some(best) => PromptRecognizerResult::success(best.resolution),
            None => PromptRecognizerResult::failed(),
        })
    }

    fn signature(&self) -> String {
        format!(
            "style={:?};locale={};partial={}",
            self.style,
            self.default_locale.as_deref().unwrap_or(""),
            self.recognizer_options.allow_partial_matches
        )
    }
}

pub type ChoicePrompt = Prompt<ChoiceRecognizer>;

impl Prompt<ChoiceRecognizer> {
    pub fn new(id: impl Into<String>) -> Self {
        Prompt::with_recognizer(id, ChoiceRecognizer::default())
    }

    pub fn with_style(mut self, style: ListStyle) -> Self {
        self.recognizer_mut().style = style;
        self
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.recognizer_mut().default_locale = Some(locale.into());
        self
    }

    /// Overrides the culture's separators and numbering.
    pub fn with_choice_options(mut self, options: ChoiceFactoryOptions) -> Self {
        self.recognizer_mut().choice_options = Some(options);
        self
    }

    pub fn with_recognizer_options(mut self, options: FindChoicesOptions) -> Self {
        self.recognizer_mut().recognizer_options = options;
        self
    }
}
