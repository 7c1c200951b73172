//! Domain layer containing the dialog engine's core types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (activities, IDs, errors, state machines)
//! - `dialogs` - Dialog stack, contexts, waterfalls, containers, versioning
//! - `prompts` - Typed prompts (text, number, confirm, choice)
//! - `choices` - Choice model, cultures, rendering and recognition

pub mod choices;
pub mod dialogs;
pub mod foundation;
pub mod prompts;
