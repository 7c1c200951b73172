//! Dialog orchestration.
//!
//! # Module Organization
//!
//! - `dialog` - The tagged `Dialog` variants and the `DialogBehavior` trait
//! - `dialog_set` - Registry of dialogs addressable by id
//! - `context` - Run-time cursor over a conversation's dialog stack
//! - `waterfall` - Step-sequenced dialogs
//! - `component` - Dialogs that run their own inner dialog set
//! - `state` - Persisted stack frames
//! - `state_accessor` - Per-conversation leases over the storage port
//! - `version` - Structural version fingerprints

mod component;
mod context;
mod dialog;
mod dialog_set;
mod state;
mod state_accessor;
mod version;
mod waterfall;

pub use component::ComponentDialog;
pub use context::{DialogContext, VersionChangePolicy};
pub use dialog::{Dialog, DialogBehavior, DialogKind, DialogReason, DialogTurnResult, DialogTurnStatus};
pub use dialog_set::DialogSet;
pub use state::{DialogInstance, DialogState};
pub use state_accessor::{DialogStateAccessor, DialogStateLease};
pub use version::{SignatureBuilder, VersionFingerprint};
pub use waterfall::{StepAction, WaterfallDialog, WaterfallStep, WaterfallStepContext};
