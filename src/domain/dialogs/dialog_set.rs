//! Registry of dialogs addressable by id.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::{DialogError, ValidationError};
use crate::ports::TurnContext;

use super::dialog::Dialog;
use super::state_accessor::{DialogStateAccessor, DialogStateLease};
use super::version::{SignatureBuilder, VersionFingerprint};

/// Dialogs keyed by id, in registration order.
///
/// The root set of a bot carries the state accessor used to load each
/// conversation's stack. Sets owned by containers are detached.
pub struct DialogSet {
    dialogs: Vec<Dialog>,
    index: HashMap<String, usize>,
    accessor: Option<Arc<DialogStateAccessor>>,
}

impl DialogSet {
    /// Creates a root dialog set.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when no accessor is supplied.
    pub fn new(accessor: Option<Arc<DialogStateAccessor>>) -> Result<Self, DialogError> {
        let accessor = accessor.ok_or_else(|| DialogError::missing_argument("dialog_state"))?;
        Ok(Self {
            dialogs: Vec::new(),
            index: HashMap::new(),
            accessor: Some(accessor),
        })
    }

    /// Creates a set with no persisted-state accessor, as owned by containers.
    pub fn detached() -> Self {
        Self {
            dialogs: Vec::new(),
            index: HashMap::new(),
            accessor: None,
        }
    }

    /// Registers a dialog under its id.
    ///
    /// # Errors
    /// - `InvalidArgument` if the dialog id is empty
    /// - `DuplicateId` if a dialog with the same id is already registered
    pub fn add(&mut self, dialog: impl Into<Dialog>) -> Result<&mut Self, DialogError> {
        let dialog = dialog.into();
        let id = dialog.id().to_string();
        if id.trim().is_empty() {
            return Err(DialogError::invalid_argument(
                "dialog.id",
                ValidationError::empty_field("dialog.id").to_string(),
            ));
        }
        if self.index.contains_key(&id) {
            return Err(DialogError::DuplicateId(id));
        }

        tracing::debug!(dialog_id = %id, kind = %dialog.kind(), "Registered dialog");
        self.index.insert(id, self.dialogs.len());
        self.dialogs.push(dialog);
        Ok(self)
    }

    pub fn find(&self, id: &str) -> Option<&Dialog> {
        self.index.get(id).map(|&i| &self.dialogs[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    /// Registered dialogs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Dialog> {
        self.dialogs.iter()
    }

    /// Fingerprint over every registered dialog's signature.
    pub fn version(&self) -> VersionFingerprint {
        self.signature().finish()
    }

    /// Signature builder seeded with every registered dialog's contribution.
    pub(crate) fn signature(&self) -> SignatureBuilder {
        let mut builder = SignatureBuilder::new();
        for dialog in &self.dialogs {
            builder.push(&dialog.signature_contribution());
        }
        builder
    }

    pub fn accessor(&self) -> Option<&Arc<DialogStateAccessor>> {
        self.accessor.as_ref()
    }

    /// Acquires the state lease for the turn's conversation.
    ///
    /// # Errors
    /// - `InvalidArgument` for a detached set or a turn without a conversation id
    /// - `Storage` if loading fails
    pub async fn load_state(&self, turn: &dyn TurnContext) -> Result<DialogStateLease, DialogError> {
        let accessor = self.accessor.as_ref().ok_or_else(|| {
            DialogError::invalid_argument("dialog_state", "dialog set has no state accessor")
        })?;
        let conversation_id = turn.conversation_id().ok_or_else(|| {
            DialogError::invalid_argument("turn.activity.conversation_id", "value cannot be null")
        })?;
        accessor.acquire(conversation_id).await
    }
}

impl std::fmt::Debug for DialogSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogSet")
            .field("dialogs", &self.dialogs)
            .field("attached", &self.accessor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryStateStorage;
    use crate::domain::dialogs::WaterfallDialog;

    fn accessor() -> Arc<DialogStateAccessor> {
        Arc::new(DialogStateAccessor::new(Arc::new(InMemoryStateStorage::new())))
    }

    #[test]
    fn new_without_accessor_is_invalid_argument() {
        let err = DialogSet::new(None).unwrap_err();
        assert!(matches!(err, DialogError::InvalidArgument { argument: "dialog_state", .. }));
    }

    #[test]
    fn add_and_find() {
        let mut set = DialogSet::new(Some(accessor())).unwrap();
        set.add(WaterfallDialog::new("a")).unwrap();

        assert!(set.find("a").is_some());
        assert!(set.find("b").is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut set = DialogSet::detached();
        set.add(WaterfallDialog::new("a")).unwrap();

        let err = set.add(WaterfallDialog::new("a")).unwrap_err();
        assert!(matches!(err, DialogError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn empty_id_is_rejected() {
        let mut set = DialogSet::detached();
        let err = set.add(WaterfallDialog::new("")).unwrap_err();
        assert!(matches!(err, DialogError::InvalidArgument { .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn iter_preserves_registration_order() {
        let mut set = DialogSet::detached();
        set.add(WaterfallDialog::new("z")).unwrap();
        set.add(WaterfallDialog::new("a")).unwrap();
        set.add(WaterfallDialog::new("m")).unwrap();

        let ids: Vec<_> = set.iter().map(|d| d.id().to_string()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn version_changes_when_a_dialog_is_added() {
        let mut set = DialogSet::detached();
        let empty = set.version();
        assert_eq!(empty, DialogSet::detached().version());

        set.add(WaterfallDialog::new("a")).unwrap();
        let one = set.version();
        assert_ne!(empty, one);
        assert_eq!(one, set.version());
    }
}
