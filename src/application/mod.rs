//! Application layer - turn orchestration.
//!
//! The `DialogManager` is the `TurnHandler` that hosts a root dialog and
//! owns the load, run, persist cycle of every turn.

mod dialog_manager;

pub use dialog_manager::DialogManager;
