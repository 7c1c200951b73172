//! Persisted dialog stack.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::DialogError;

/// One frame on the dialog stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogInstance {
    /// Id of the dialog in the owning dialog set.
    pub id: String,
    /// Opaque per-instance state owned by the dialog.
    #[serde(default)]
    pub state: Map<String, Value>,
    /// Index of the step that last ran (waterfalls only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    /// Version fingerprint of the dialog when the frame was pushed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DialogInstance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Map::new(),
            step_index: None,
            version: None,
        }
    }

    /// Reads a typed value out of the frame state.
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DialogError> {
        match self.state.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Writes a typed value into the frame state.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), DialogError> {
        self.state.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }
}

/// The dialog stack of one conversation, outermost dialog first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogState {
    #[serde(default)]
    pub dialog_stack: Vec<DialogInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DialogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.dialog_stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.dialog_stack.len()
    }

    /// The innermost (active) frame.
    pub fn active(&self) -> Option<&DialogInstance> {
        self.dialog_stack.last()
    }

    pub fn active_mut(&mut self) -> Option<&mut DialogInstance> {
        self.dialog_stack.last_mut()
    }

    /// Records the time the state was last persisted.
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn active_is_the_last_pushed_frame() {
        let mut state = DialogState::new();
        state.dialog_stack.push(DialogInstance::new("outer"));
        state.dialog_stack.push(DialogInstance::new("inner"));

        assert_eq!(state.depth(), 2);
        assert_eq!(state.active().map(|f| f.id.as_str()), Some("inner"));
    }

    #[test]
    fn typed_get_and_set_use_frame_state() {
        let mut frame = DialogInstance::new("prompt");
        frame.set("attemptCount", &3u32).unwrap();

        assert_eq!(frame.get::<u32>("attemptCount").unwrap(), Some(3));
        assert_eq!(frame.get::<u32>("missing").unwrap(), None);
    }

    #[test]
    fn typed_get_reports_shape_mismatch() {
        let mut frame = DialogInstance::new("prompt");
        frame.state.insert("attemptCount".to_string(), json!("three"));

        assert!(frame.get::<u32>("attemptCount").is_err());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut frame = DialogInstance::new("waterfall");
        frame.step_index = Some(1);
        let state = DialogState {
            dialog_stack: vec![frame],
            updated_at: None,
        };

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["dialogStack"][0]["id"], "waterfall");
        assert_eq!(value["dialogStack"][0]["stepIndex"], 1);
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn touch_sets_updated_at() {
        let mut state = DialogState::new();
        state.touch();
        assert!(state.updated_at.is_some());
    }
}
