//! Per-language rendering and yes/no vocabulary for prompts.

use once_cell::sync::Lazy;

/// Language-specific connectors and confirmation words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCulture {
    pub locale: &'static str,
    /// Separator between inline choices.
    pub separator: &'static str,
    /// Connector between exactly two inline choices.
    pub inline_or: &'static str,
    /// Connector before the last of three or more inline choices.
    pub inline_or_more: &'static str,
    pub yes_in_language: &'static str,
    pub no_in_language: &'static str,
}

pub const ENGLISH_LOCALE: &str = "en-us";

static CULTURES: Lazy<Vec<PromptCulture>> = Lazy::new(|| {
    vec![
        culture("zh-cn", "， ", " 要么 ", "， 要么 ", "是的", "不"),
        culture("nl-nl", ", ", " of ", ", of ", "Ja", "Nee"),
        culture(ENGLISH_LOCALE, ", ", " or ", ", or ", "Yes", "No"),
        culture("fr-fr", ", ", " ou ", ", ou ", "Oui", "Non"),
        culture("de-de", ", ", " oder ", ", oder ", "Ja", "Nein"),
        culture("it-it", ", ", " o ", " o ", "Si", "No"),
        culture("ja-jp", "、 ", " または ", "、 または ", "はい", "いいえ"),
        culture("pt-br", ", ", " ou ", ", ou ", "Sim", "Não"),
        culture("es-es", ", ", " o ", ", o ", "Sí", "No"),
        culture("sv-se", ", ", " eller ", " eller ", "Ja", "Nej"),
    ]
});

fn culture(
    locale: &'static str,
    separator: &'static str,
    inline_or: &'static str,
    inline_or_more: &'static str,
    yes_in_language: &'static str,
    no_in_language: &'static str,
) -> PromptCulture {
    PromptCulture {
        locale,
        separator,
        inline_or,
        inline_or_more,
        yes_in_language,
        no_in_language,
    }
}

/// Every supported culture.
pub fn supported_cultures() -> &'static [PromptCulture] {
    &CULTURES
}

/// Maps a locale to the closest supported one.
///
/// Tries an exact match, then any supported locale sharing the language
/// prefix. Falls back to English.
pub fn map_to_nearest_language(locale: Option<&str>) -> &'static str {
    let Some(locale) = locale.map(|l| l.trim().to_ascii_lowercase().replace('_', "-")) else {
        return ENGLISH_LOCALE;
    };
    if locale.is_empty() {
        return ENGLISH_LOCALE;
    }

    if let Some(exact) = CULTURES.iter().find(|c| c.locale == locale) {
        return exact.locale;
    }

    let language = locale.split('-').next().unwrap_or_default();
    CULTURES
        .iter()
        .find(|c| c.locale.split('-').next() == Some(language))
        .map_or(ENGLISH_LOCALE, |c| c.locale)
}

/// The culture to use for a locale.
pub fn culture_for(locale: Option<&str>) -> &'static PromptCulture {
    let mapped = map_to_nearest_language(locale);
    CULTURES
        .iter()
        .find(|c| c.locale == mapped)
        .unwrap_or_else(english)
}

fn english() -> &'static PromptCulture {
    // The table always carries English.
    &CULTURES[2]
}
