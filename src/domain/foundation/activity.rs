//! Activity - the unit of conversational traffic in both directions.
//!
//! Only the fields the dialog engine reads or writes are modelled here.
//! Cards, attachments and channel payloads belong to channel adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActivityId, ConversationId};

/// Kind of activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    #[default]
    Message,
    Event,
    ConversationUpdate,
    Typing,
}

/// Hint to the channel about whether the bot expects a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputHint {
    AcceptingInput,
    ExpectingInput,
    IgnoringInput,
}

/// An inbound or outbound activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_hint: Option<InputHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl Activity {
    /// Creates a message activity carrying `text`.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::of_type(ActivityType::Message)
        }
    }

    /// Creates a named event activity.
    pub fn event(name: impl Into<String>, value: Option<serde_json::Value>) -> Self {
        Self {
            name: Some(name.into()),
            value,
            ..Self::of_type(ActivityType::Event)
        }
    }

    /// Creates an empty activity of the given type.
    pub fn of_type(activity_type: ActivityType) -> Self {
        Self {
            id: ActivityId::new(),
            activity_type,
            conversation_id: None,
            text: None,
            speak: None,
            locale: None,
            input_hint: None,
            name: None,
            value: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_speak(mut self, speak: impl Into<String>) -> Self {
        self.speak = Some(speak.into());
        self
    }

    pub fn with_input_hint(mut self, hint: InputHint) -> Self {
        self.input_hint = Some(hint);
        self
    }

    /// Returns true for message activities.
    pub fn is_message(&self) -> bool {
        self.activity_type == ActivityType::Message
    }

    /// Returns the message text, or an empty string.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}
