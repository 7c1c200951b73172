//! Prompts - dialogs that ask for a single typed value.

mod choice;
mod confirm;
mod number;
mod prompt;
mod text;

pub use choice::{ChoicePrompt, ChoiceRecognizer};
pub use confirm::{ConfirmPrompt, ConfirmRecognizer};
pub use number::{parse_first_number, NumberPrompt, NumberRecognizer, NumberValue};
pub use prompt::{
    send_prompt, Prompt, PromptOptions, PromptRecognizer, PromptRecognizerResult, PromptStatus,
    PromptValidator, PromptValidatorContext,
};
pub use text::{TextPrompt, TextRecognizer};
