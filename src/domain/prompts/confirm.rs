//! Yes/no prompt.

use async_trait::async_trait;

use crate::domain::choices::{
    culture_for, recognize_choices, tokenize, Choice, ChoiceFactory, ChoiceFactoryOptions,
    FindChoicesOptions, ListStyle, PromptCulture,
};
use crate::domain::foundation::{Activity, DialogError};
use crate::ports::TurnContext;

use super::prompt::{Prompt, PromptOptions, PromptRecognizer, PromptRecognizerResult};

const ENGLISH_YES: [&str; 8] = ["yes", "y", "yeah", "yep", "sure", "ok", "okay", "true"];
const ENGLISH_NO: [&str; 5] = ["no", "n", "nope", "nah", "false"];
const NEGATIONS: [&str; 3] = ["not", "never", "hardly"];

/// Renders yes/no choices and recognizes confirmations.
#[derive(Debug, Clone)]
pub struct ConfirmRecognizer {
    default_locale: Option<String>,
    style: ListStyle,
    confirm_choices: Option<(Choice, Choice)>,
    choice_options: Option<ChoiceFactoryOptions>,
}

impl Default for ConfirmRecognizer {
    fn default() -> Self {
        Self {
            default_locale: None,
            style: ListStyle::Auto,
            confirm_choices: None,
            choice_options: None,
        }
    }
}

impl ConfirmRecognizer {
    fn culture(&self, activity: &Activity) -> &'static PromptCulture {
        culture_for(activity.locale.as_deref().or(self.default_locale.as_deref()))
    }

    fn choices(&self, culture: &PromptCulture) -> [Choice; 2] {
        match &self.confirm_choices {
            Some((yes, no)) => [yes.clone(), no.clone()],
            None => [
                Choice::new(culture.yes_in_language),
                Choice::new(culture.no_in_language),
            ],
        }
    }

    fn match_word(&self, utterance: &str, culture: &PromptCulture) -> Option<bool> {
        let yes = culture.yes_in_language.to_lowercase();
        let no = culture.no_in_language.to_lowercase();
        let is_yes = |w: &str| w == yes || ENGLISH_YES.contains(&w);
        let is_no = |w: &str| w == no || ENGLISH_NO.contains(&w);

        let whole = utterance
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();
        if is_yes(&whole) {
            return Some(true);
        }
        if is_no(&whole) {
            return Some(false);
        }

        // A negated yes ("not sure") is not an answer either way.
        let tokens = tokenize(utterance);
        tokens.iter().enumerate().find_map(|(i, token)| {
            let negated = i > 0 && NEGATIONS.contains(&tokens[i - 1].normalized.as_str());
            if is_yes(&token.normalized) && !negated {
                Some(true)
            } else if is_no(&token.normalized) {
                Some(false)
            } else {
                None
            }
        })
    }
}

#[async_trait]
impl PromptRecognizer for ConfirmRecognizer {
    type Value = bool;

    fn kind(&self) -> &'static str {
        "confirm"
    }

    async fn on_prompt(
        &self,
        turn: &dyn TurnContext,
        options: &PromptOptions,
        is_retry: bool,
    ) -> Result<(), DialogError> {
        let culture = self.culture(turn.activity());
        let factory_options = self
            .choice_options
            .clone()
            .unwrap_or_else(|| ChoiceFactoryOptions::for_culture(culture));
        let base = options
            .select_prompt(is_retry)
            .cloned()
            .unwrap_or_else(|| Activity::message(""));
        let style = options.style.unwrap_or(self.style);

        let activity = ChoiceFactory::append_choices(&base, &self.choices(culture), style, &factory_options);
        turn.send_activity(activity).await
    }

    async fn on_recognize(
        &self,
        turn: &dyn TurnContext,
        _options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<bool>, DialogError> {
        let activity = turn.activity();
        let utterance = activity.text_or_empty();
        if !activity.is_message() || utterance.trim().is_empty() {
            return Ok(PromptRecognizerResult::failed());
        }

        let culture = self.culture(activity);
        if let Some(confirmed) = self.match_word(utterance, culture) {
            return Ok(PromptRecognizerResult::success(confirmed));
        }

        let choices = self.choices(culture);
        let found = recognize_choices(utterance, &choices, &FindChoicesOptions::default());
        Ok(match found.first() {
            Some(result) => PromptRecognizerResult::success(result.resolution.index == 0),
            None => PromptRecognizerResult::failed(),
        })
    }

    fn signature(&self) -> String {
        format!(
            "style={:?};locale={}",
            self.style,
            self.default_locale.as_deref().unwrap_or("")
        )
    }
}

pub type ConfirmPrompt = Prompt<ConfirmRecognizer>;

impl Prompt<ConfirmRecognizer> {
    pub fn new(id: impl Into<String>) -> Self {
        Prompt::with_recognizer(id, ConfirmRecognizer::default())
    }

    pub fn with_style(mut self, style: ListStyle) -> Self {
        self.recognizer_mut().style = style;
        self
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.recognizer_mut().default_locale = Some(locale.into());
        self
    }

    /// Replaces the culture's yes/no choices.
    pub fn with_confirm_choices(mut self, yes: Choice, no: Choice) -> Self {
        self.recognizer_mut().confirm_choices = Some((yes, no));
        self
    }

    pub fn with_choice_options(mut self, options: ChoiceFactoryOptions) -> Self {
        self.recognizer_mut().choice_options = Some(options);
        self
    }
}
