//! Numeric prompt.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::domain::foundation::DialogError;
use crate::ports::TurnContext;

use super::prompt::{Prompt, PromptOptions, PromptRecognizer, PromptRecognizerResult};

/// Numeric types a [`NumberPrompt`] can return.
pub trait NumberValue:
    FromStr + Serialize + DeserializeOwned + Clone + Send + Sync + fmt::Debug + 'static
{
}

impl<T> NumberValue for T where
    T: FromStr + Serialize + DeserializeOwned + Clone + Send + Sync + fmt::Debug + 'static
{
}

/// Takes the first token of the reply that parses as `T`.
///
/// Thousands separators (`,`) are ignored and surrounding punctuation is
/// trimmed, so `"about 1,200."` recognizes as `1200`.
pub struct NumberRecognizer<T> {
    _value: PhantomData<fn() -> T>,
}

impl<T> Default for NumberRecognizer<T> {
    fn default() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for NumberRecognizer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumberRecognizer")
            .field("value", &std::any::type_name::<T>())
            .finish()
    }
}

/// Parses the first numeric token in `text`.
pub fn parse_first_number<T: FromStr>(text: &str) -> Option<T> {
    text.split_whitespace().find_map(|word| {
        let cleaned: String = word
            .trim_start_matches(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.')))
            .trim_end_matches(|c: char| !c.is_ascii_digit())
            .chars()
            .filter(|&c| c != ',')
            .collect();
        if cleaned.is_empty() {
            return None;
        }
        cleaned.parse().ok()
    })
}

#[async_trait]
impl<T: NumberValue> PromptRecognizer for NumberRecognizer<T> {
    type Value = T;

    fn kind(&self) -> &'static str {
        "number"
    }

    async fn on_recognize(
        &self,
        turn: &dyn TurnContext,
        _options: &PromptOptions,
    ) -> Result<PromptRecognizerResult<T>, DialogError> {
        let activity = turn.activity();
        if !activity.is_message() {
            return Ok(PromptRecognizerResult::failed());
        }
        Ok(match parse_first_number(activity.text_or_empty()) {
            Some(value) => PromptRecognizerResult::success(value),
            None => PromptRecognizerResult::failed(),
        })
    }

    fn signature(&self) -> String {
        std::any::type_name::<T>().to_string()
    }
}

pub type NumberPrompt<T> = Prompt<NumberRecognizer<T>>;

impl<T: NumberValue> Prompt<NumberRecognizer<T>> {
    pub fn new(id: impl Into<String>) -> Self {
        Prompt::with_recognizer(id, NumberRecognizer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testing::TestTurnContext;

    #[test]
    fn parses_plain_integers() {
        assert_eq!(parse_first_number::<i64>("42"), Some(42));
        assert_eq!(parse_first_number::<i64>("-7"), Some(-7));
    }

    #[test]
    fn parses_numbers_inside_sentences() {
        assert_eq!(parse_first_number::<i64>("I am 64 years old."), Some(64));
        assert_eq!(parse_first_number::<u32>("about 1,200."), Some(1200));
        assert_eq!(parse_first_number::<f64>("costs $3.50"), Some(3.5));
    }

    #[test]
    fn skips_tokens_of_the_wrong_type() {
        assert_eq!(parse_first_number::<i64>("2.5 or 3"), Some(3));
        assert_eq!(parse_first_number::<i64>("hello"), None);
        assert_eq!(parse_first_number::<i64>(""), None);
    }

    #[tokio::test]
    async fn recognizer_returns_typed_value() {
        let turn = TestTurnContext::message("give me 12 please");
        let recognizer = NumberRecognizer::<i32>::default();
        let result = recognizer
            .on_recognize(&turn, &PromptOptions::default())
            .await
            .unwrap();
        assert_eq!(result.value, Some(12));
    }

    #[test]
    fn signature_names_the_value_type() {
        let prompt = NumberPrompt::<f64>::new("amount");
        assert_eq!(prompt.recognizer().signature(), "f64");
        assert_eq!(prompt.recognizer().kind(), "number");
    }
}
