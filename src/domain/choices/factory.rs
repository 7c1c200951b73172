//! Renders choice lists into prompt text.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Activity;

use super::choice::{Choice, ListStyle};
use super::culture::{culture_for, PromptCulture};

/// Auto style goes inline only up to this many choices.
pub const MAX_INLINE_CHOICES: usize = 3;
/// Auto style goes inline only if no title is longer than this.
pub const MAX_INLINE_TITLE_LENGTH: usize = 20;

/// Connectors used when rendering choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceFactoryOptions {
    pub inline_separator: String,
    pub inline_or: String,
    pub inline_or_more: String,
    pub include_numbers: bool,
}

impl ChoiceFactoryOptions {
    pub fn for_culture(culture: &PromptCulture) -> Self {
        Self {
            inline_separator: culture.separator.to_string(),
            inline_or: culture.inline_or.to_string(),
            inline_or_more: culture.inline_or_more.to_string(),
            include_numbers: true,
        }
    }

    pub fn for_locale(locale: Option<&str>) -> Self {
        Self::for_culture(culture_for(locale))
    }
}

impl Default for ChoiceFactoryOptions {
    fn default() -> Self {
        Self::for_locale(None)
    }
}

/// Choice-list renderer.
pub struct ChoiceFactory;

impl ChoiceFactory {
    /// Picks a concrete style for `Auto`; other styles pass through.
    pub fn resolve_style(style: ListStyle, choices: &[Choice]) -> ListStyle {
        if style != ListStyle::Auto {
            return style;
        }
        let longest = choices
            .iter()
            .map(|c| c.title().chars().count())
            .max()
            .unwrap_or(0);
        if choices.len() <= MAX_INLINE_CHOICES && longest <= MAX_INLINE_TITLE_LENGTH {
            ListStyle::Inline
        } else {
            ListStyle::List
        }
    }

    /// Renders `text` followed by the choices in the given style.
    pub fn for_style(
        style: ListStyle,
        choices: &[Choice],
        text: &str,
        options: &ChoiceFactoryOptions,
    ) -> String {
        match Self::resolve_style(style, choices) {
            ListStyle::Inline => Self::inline(choices, text, options),
            ListStyle::List => Self::list(choices, text, options),
            ListStyle::None | ListStyle::Auto => text.to_string(),
        }
    }

    /// `"<text> (1) a, (2) b, or (3) c"`
    pub fn inline(choices: &[Choice], text: &str, options: &ChoiceFactoryOptions) -> String {
        if choices.is_empty() {
            return text.to_string();
        }

        let mut out = String::from(text);
        if !out.is_empty() {
            out.push(' ');
        }

        let mut connector: &str = "";
        for (index, choice) in choices.iter().enumerate() {
            out.push_str(connector);
            if options.include_numbers {
                out.push_str(&format!("({}) ", index + 1));
            }
            out.push_str(choice.title());

            connector = if index + 2 == choices.len() {
                if index == 0 {
                    options.inline_or.as_str()
                } else {
                    options.inline_or_more.as_str()
                }
            } else {
                options.inline_separator.as_str()
            };
        }
        out
    }

    /// `"<text>\n\n   1. a\n   2. b"`
    pub fn list(choices: &[Choice], text: &str, options: &ChoiceFactoryOptions) -> String {
        let mut out = String::from(text);
        let mut connector = "\n\n   ";
        for (index, choice) in choices.iter().enumerate() {
            out.push_str(connector);
            if options.include_numbers {
                out.push_str(&format!("{}. ", index + 1));
            } else {
                out.push_str("- ");
            }
            out.push_str(choice.title());
            connector = "\n   ";
        }
        out
    }

    /// Copies `prompt` with its text replaced by the rendered choice list.
    pub fn append_choices(
        prompt: &Activity,
        choices: &[Choice],
        style: ListStyle,
        options: &ChoiceFactoryOptions,
    ) -> Activity {
        let mut activity = prompt.clone();
        activity.text = Some(Self::for_style(style, choices, prompt.text_or_empty(), options));
        activity
    }
}
