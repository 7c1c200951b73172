//! In-memory turn context that records everything sent.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::foundation::{Activity, ConversationId, DialogError};
use crate::ports::TurnContext;

/// Conversation id given to activities that arrive without one.
pub const TEST_CONVERSATION_ID: &str = "test-conversation";

/// A [`TurnContext`] for tests.
///
/// # Example
///
/// ```ignore
/// let turn = TestTurnContext::message("hi");
/// turn.send_text("hello").await?;
/// assert_eq!(turn.sent_texts(), vec!["hello"]);
/// ```
#[derive(Debug)]
pub struct TestTurnContext {
    activity: Activity,
    sent: Mutex<Vec<Activity>>,
    responded: AtomicBool,
}

impl TestTurnContext {
    /// Wraps an inbound activity, defaulting its conversation id.
    pub fn new(mut activity: Activity) -> Self {
        if activity.conversation_id.is_none() {
            activity.conversation_id = ConversationId::new(TEST_CONVERSATION_ID).ok();
        }
        Self {
            activity,
            sent: Mutex::new(Vec::new()),
            responded: AtomicBool::new(false),
        }
    }

    /// Shorthand for an inbound message turn.
    pub fn message(text: impl Into<String>) -> Self {
        Self::new(Activity::message(text))
    }

    /// Activities sent during the turn, in order.
    pub fn sent(&self) -> Vec<Activity> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|activity| activity.text.unwrap_or_default())
            .collect()
    }
}

#[async_trait]
impl TurnContext for TestTurnContext {
    fn activity(&self) -> &Activity {
        &self.activity
    }

    async fn send_activity(&self, mut activity: Activity) -> Result<(), DialogError> {
        if activity.conversation_id.is_none() {
            activity.conversation_id = self.activity.conversation_id.clone();
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(activity);
        self.responded.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn responded(&self) -> bool {
        self.responded.load(Ordering::SeqCst)
    }
}
