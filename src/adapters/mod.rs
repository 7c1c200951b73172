//! Adapters - Implementations of port interfaces.
//!
//! - `storage` - `StateStorage` backed by memory or YAML files
//! - `testing` - in-memory `TurnContext` and scripted conversations

pub mod storage;
pub mod testing;
