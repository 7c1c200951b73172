//! Storage Adapters
//!
//! Implementations of the StateStorage port for persisting dialog state.
//!
//! ## Available Adapters
//!
//! - **FileStateStorage** - Stores state as YAML files on disk
//! - **InMemoryStateStorage** - Stores state in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use dialog_engine::adapters::storage::{FileStateStorage, InMemoryStateStorage};
//!
//! // Durable: file-based storage
//! let storage = FileStateStorage::new("./data/dialogs");
//!
//! // Testing: in-memory storage
//! let storage = InMemoryStateStorage::new();
//! ```

mod file_state_storage;
mod in_memory_state_storage;

pub use file_state_storage::FileStateStorage;
pub use in_memory_state_storage::InMemoryStateStorage;
