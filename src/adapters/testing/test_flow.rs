//! Scripted conversations against a [`TurnHandler`].
//!
//! ```ignore
//! TestAdapter::new(manager)
//!     .send("hi")
//!     .assert_reply("step1")
//!     .send("hi")
//!     .assert_reply("step2")
//!     .run()
//!     .await?;
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::{Activity, ConversationId, DialogError};
use crate::ports::{TurnContext, TurnHandler};

use super::TestTurnContext;

/// Why a scripted conversation did not go as expected.
#[derive(Debug, Error)]
pub enum TestFlowError {
    #[error("Turn {turn} failed: {source}")]
    Turn {
        turn: usize,
        #[source]
        source: DialogError,
    },

    #[error("Expected reply {expected:?} but the bot sent nothing more")]
    MissingReply { expected: String },

    #[error("Expected reply {expected:?} but got {actual:?}")]
    UnexpectedReply { expected: String, actual: String },

    #[error("Reply {actual:?} was rejected: {reason}")]
    RejectedReply { actual: String, reason: String },

    #[error("Expected no more replies but got {actual:?}")]
    ExtraReply { actual: String },
}

type ReplyCheck = Box<dyn Fn(&Activity) -> Result<(), String> + Send + Sync>;

enum Step {
    Send(Activity),
    AssertReply(String),
    AssertReplyWith(ReplyCheck),
    AssertNoReply,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Send(activity) => f.debug_tuple("Send").field(&activity.text).finish(),
            Step::AssertReply(text) => f.debug_tuple("AssertReply").field(text).finish(),
            Step::AssertReplyWith(_) => f.write_str("AssertReplyWith"),
            Step::AssertNoReply => f.write_str("AssertNoReply"),
        }
    }
}

/// Drives a handler with one conversation's worth of inbound activities.
#[derive(Clone)]
pub struct TestAdapter {
    handler: Arc<dyn TurnHandler>,
    conversation_id: ConversationId,
    locale: Option<String>,
}

impl TestAdapter {
    pub fn new(handler: Arc<dyn TurnHandler>) -> Self {
        Self {
            handler,
            conversation_id: ConversationId::generate(),
            locale: None,
        }
    }

    pub fn with_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    /// Locale stamped on every inbound activity.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Starts a script with an inbound message.
    pub fn send(self, text: impl Into<String>) -> TestFlow {
        TestFlow {
            adapter: self,
            steps: Vec::new(),
        }
        .send(text)
    }

    /// Runs a single turn and returns what the bot sent.
    ///
    /// # Errors
    /// Returns the handler's error.
    pub async fn process_activity(&self, activity: Activity) -> Result<Vec<Activity>, DialogError> {
        let mut activity = activity.with_conversation(self.conversation_id.clone());
        if activity.locale.is_none() {
            activity.locale = self.locale.clone();
        }
        let turn = Arc::new(TestTurnContext::new(activity));
        let dyn_turn: Arc<dyn TurnContext> = turn.clone();
        self.handler.on_turn(dyn_turn).await?;
        Ok(turn.sent())
    }
}

impl fmt::Debug for TestAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestAdapter")
            .field("conversation_id", &self.conversation_id)
            .field("locale", &self.locale)
            .finish()
    }
}

/// A script of inbound activities and expected replies.
///
/// Replies are checked in order; each `send` first requires every reply
/// from earlier turns to have been asserted.
#[derive(Debug)]
pub struct TestFlow {
    adapter: TestAdapter,
    steps: Vec<Step>,
}

impl TestFlow {
    pub fn send(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::Send(Activity::message(text)));
        self
    }

    pub fn send_activity(mut self, activity: Activity) -> Self {
        self.steps.push(Step::Send(activity));
        self
    }

    /// Expects the next reply's text to equal `text`.
    pub fn assert_reply(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::AssertReply(text.into()));
        self
    }

    /// Expects the next reply to pass `check`.
    pub fn assert_reply_with<F>(mut self, check: F) -> Self
    where
        F: Fn(&Activity) -> Result<(), String> + Send + Sync + 'static,
    {
        self.steps.push(Step::AssertReplyWith(Box::new(check)));
        self
    }

    /// Expects every reply so far to have been asserted.
    pub fn assert_no_reply(mut self) -> Self {
        self.steps.push(Step::AssertNoReply);
        self
    }

    /// Runs the script.
    ///
    /// # Errors
    /// Returns the first failed expectation or handler error.
    pub async fn run(self) -> Result<(), TestFlowError> {
        let mut pending: VecDeque<Activity> = VecDeque::new();
        let mut turn = 0;

        for step in self.steps {
            match step {
                Step::Send(activity) => {
                    if let Some(extra) = pending.pop_front() {
                        return Err(TestFlowError::ExtraReply {
                            actual: extra.text.unwrap_or_default(),
                        });
                    }
                    turn += 1;
                    let replies = self
                        .adapter
                        .process_activity(activity)
                        .await
                        .map_err(|source| TestFlowError::Turn { turn, source })?;
                    pending.extend(replies);
                }
                Step::AssertReply(expected) => {
                    let reply = pending
                        .pop_front()
                        .ok_or_else(|| TestFlowError::MissingReply {
                            expected: expected.clone(),
                        })?;
                    let actual = reply.text.unwrap_or_default();
                    if actual != expected {
                        return Err(TestFlowError::UnexpectedReply { expected, actual });
                    }
                }
                Step::AssertReplyWith(check) => {
                    let reply = pending
                        .pop_front()
                        .ok_or_else(|| TestFlowError::MissingReply {
                            expected: "<custom check>".to_string(),
                        })?;
                    if let Err(reason) = check(&reply) {
                        return Err(TestFlowError::RejectedReply {
                            actual: reply.text.unwrap_or_default(),
                            reason,
                        });
                    }
                }
                Step::AssertNoReply => {
                    if let Some(extra) = pending.pop_front() {
                        return Err(TestFlowError::ExtraReply {
                            actual: extra.text.unwrap_or_default(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
