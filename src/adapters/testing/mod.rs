//! Testing Adapters
//!
//! In-memory transport for exercising dialogs without a channel.
//!
//! - **TestTurnContext** - one turn, records what the bot sent
//! - **TestAdapter / TestFlow** - scripted multi-turn conversations

mod test_flow;
mod test_turn_context;

pub use test_flow::{TestAdapter, TestFlow, TestFlowError};
pub use test_turn_context::{TestTurnContext, TEST_CONVERSATION_ID};
