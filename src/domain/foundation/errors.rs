//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

use crate::ports::StateStorageError;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Argument errors
    InvalidArgument,

    // Registry errors
    DialogNotFound,
    DuplicateId,

    // State errors
    InvalidState,
    VersionChanged,

    // Infrastructure errors
    StorageError,
    TransportError,
    SerializationError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::DialogNotFound => "DIALOG_NOT_FOUND",
            ErrorCode::DuplicateId => "DUPLICATE_ID",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::VersionChanged => "VERSION_CHANGED",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::TransportError => "TRANSPORT_ERROR",
            ErrorCode::SerializationError => "SERIALIZATION_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised by dialog engine operations.
///
/// All variants are fatal to the call that produced them. A prompt that
/// fails to recognize input is not an error; it re-prompts instead.
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    #[error("A dialog with an id of '{0}' wasn't found")]
    DialogNotFound(String),

    #[error("A dialog with an id of '{0}' has already been added")]
    DuplicateId(String),

    #[error("Dialog '{dialog_id}' changed version since it was started")]
    VersionChanged { dialog_id: String },

    #[error("Invalid dialog state: {0}")]
    InvalidState(String),

    #[error("State storage failed: {0}")]
    Storage(#[from] StateStorageError),

    #[error("Failed to send activity: {0}")]
    Transport(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl DialogError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        DialogError::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// Creates the error used when a required argument is absent.
    pub fn missing_argument(argument: &'static str) -> Self {
        Self::invalid_argument(argument, "value cannot be null")
    }

    /// Returns the stable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DialogError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            DialogError::DialogNotFound(_) => ErrorCode::DialogNotFound,
            DialogError::DuplicateId(_) => ErrorCode::DuplicateId,
            DialogError::VersionChanged { .. } => ErrorCode::VersionChanged,
            DialogError::InvalidState(_) => ErrorCode::InvalidState,
            DialogError::Storage(_) => ErrorCode::StorageError,
            DialogError::Transport(_) => ErrorCode::TransportError,
            DialogError::Serialization(_) => ErrorCode::SerializationError,
        }
    }
}

impl From<serde_json::Error> for DialogError {
    fn from(err: serde_json::Error) -> Self {
        DialogError::Serialization(err.to_string())
    }
}
