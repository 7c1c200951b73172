//! Choice value objects.

use serde::{Deserialize, Serialize};

/// One option a user can pick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Value returned when the choice is picked.
    pub value: String,
    /// Other words that also select this choice.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    /// Display title, used instead of `value` when rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_title: Option<String>,
}

impl Choice {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_action_title(mut self, title: impl Into<String>) -> Self {
        self.action_title = Some(title.into());
        self
    }

    /// The text shown to the user for this choice.
    pub fn title(&self) -> &str {
        self.action_title.as_deref().unwrap_or(&self.value)
    }

    /// Builds a list of plain choices from their values.
    pub fn list<I, S>(values: I) -> Vec<Choice>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().map(Choice::new).collect()
    }
}

impl From<&str> for Choice {
    fn from(value: &str) -> Self {
        Choice::new(value)
    }
}

impl From<String> for Choice {
    fn from(value: String) -> Self {
        Choice::new(value)
    }
}

/// How a list of choices is rendered into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListStyle {
    /// Don't render the choices.
    None,
    /// Inline for a few short choices, list otherwise.
    #[default]
    Auto,
    /// `"(1) a, (2) b, or (3) c"`
    Inline,
    /// One numbered choice per line.
    List,
}

/// The choice a user's input resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundChoice {
    /// The `value` of the matched choice.
    pub value: String,
    /// Position of the choice in the original list.
    pub index: usize,
    /// Confidence between 0 and 1.
    pub score: f32,
    /// The value, title or synonym that matched, when it was text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonym: Option<String>,
}

/// A recognized span of the utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResult<T> {
    /// Character offset of the first matched character.
    pub start: usize,
    /// Character offset of the last matched character.
    pub end: usize,
    /// The matched text.
    pub text: String,
    pub resolution: T,
}
