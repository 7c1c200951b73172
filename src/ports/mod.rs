//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the dialog engine and the outside world. Adapters implement these ports.
//!
//! - `StateStorage` - persisted per-conversation dialog state
//! - `TurnContext` - inbound activity and outbound sends for one turn
//! - `TurnHandler` - runs a turn (implemented by the dialog manager)

mod state_storage;
mod turn_context;

pub use state_storage::{StateStorage, StateStorageError};
pub use turn_context::{TurnContext, TurnHandler};
