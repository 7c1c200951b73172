//! Turn transport port.
//!
//! A [`TurnContext`] exposes the inbound activity of the current turn and a
//! way to send replies. A [`TurnHandler`] is whatever runs one turn against
//! a context, typically the dialog manager.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{Activity, ConversationId, DialogError};

/// Context for a single turn of conversation.
#[async_trait]
pub trait TurnContext: Send + Sync {
    /// The inbound activity that started this turn.
    fn activity(&self) -> &Activity;

    /// Sends an outbound activity.
    ///
    /// # Errors
    /// Returns `DialogError::Transport` if the channel rejects the activity.
    async fn send_activity(&self, activity: Activity) -> Result<(), DialogError>;

    /// True once anything has been sent during this turn.
    fn responded(&self) -> bool;

    /// The conversation this turn belongs to, if the channel supplied one.
    fn conversation_id(&self) -> Option<&ConversationId> {
        self.activity().conversation_id.as_ref()
    }

    /// Convenience wrapper for sending a plain text message.
    async fn send_text(&self, text: &str) -> Result<(), DialogError> {
        self.send_activity(Activity::message(text)).await
    }
}

/// Handles one turn of conversation.
#[async_trait]
pub trait TurnHandler: Send + Sync {
    async fn on_turn(&self, turn: Arc<dyn TurnContext>) -> Result<(), DialogError>;
}
