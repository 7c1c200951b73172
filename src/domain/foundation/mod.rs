//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, activities and error types
//! that form the vocabulary of the dialog engine.

mod activity;
mod errors;
mod ids;
mod state_machine;

pub use activity::{Activity, ActivityType, InputHint};
pub use errors::{DialogError, ErrorCode, ValidationError};
pub use ids::{ActivityId, ConversationId};
pub use state_machine::StateMachine;
