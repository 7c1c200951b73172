//! Choices - choice model, culture table, rendering and recognition.

mod choice;
mod culture;
mod factory;
mod recognizer;

pub use choice::{Choice, FoundChoice, ListStyle, ModelResult};
pub use culture::{culture_for, map_to_nearest_language, supported_cultures, PromptCulture, ENGLISH_LOCALE};
pub use factory::{ChoiceFactory, ChoiceFactoryOptions, MAX_INLINE_CHOICES, MAX_INLINE_TITLE_LENGTH};
pub use recognizer::{find_choices, recognize_choices, tokenize, FindChoicesOptions, Token};
