//! Error types for uketsuke.
//!
//! This module defines all error types used throughout the uketsuke crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for uketsuke operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A required field was empty or missing.
    #[error("required field '{field}' is empty")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    // === Registration Errors ===
    /// The referenced event does not exist.
    #[error("unknown event: {event_id}")]
    UnknownEvent {
        /// Id of the event that was not found.
        event_id: String,
    },

    /// The registration does not exist.
    #[error("unknown registration: {id}")]
    UnknownRegistration {
        /// Id of the registration that was not found.
        id: String,
    },

    /// The email address is already registered for the event.
    #[error("{email} is already registered for event {event_id}")]
    DuplicateRegistration {
        /// Id of the event.
        event_id: String,
        /// The already-registered email address.
        email: String,
    },

    /// The event has no seats left.
    #[error("event {event_id} is full")]
    EventFull {
        /// Id of the full event.
        event_id: String,
    },

    /// The registration deadline for the event has passed.
    #[error("registration deadline for event {event_id} has passed")]
    DeadlinePassed {
        /// Id of the event.
        event_id: String,
    },

    /// The event is closed and no longer accepts registrations.
    #[error("event {event_id} is closed")]
    EventClosed {
        /// Id of the closed event.
        event_id: String,
    },

    /// A checked-in registration cannot be cancelled.
    #[error("registration {id} is already checked in and cannot be cancelled")]
    CancelAfterCheckIn {
        /// Id of the checked-in registration.
        id: String,
    },

    // === Storage Errors ===
    /// Failed to read a blob from the backing store.
    #[error("failed to read blob '{key}': {source}")]
    BlobRead {
        /// Key of the blob that could not be read.
        key: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a blob to the backing store.
    #[error("failed to write blob '{key}': {source}")]
    BlobWrite {
        /// Key of the blob that could not be written.
        key: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Import Errors ===
    /// CSV input could not be parsed.
    #[error("CSV parse error at line {line}: {message}")]
    CsvParse {
        /// One-based line number of the offending row.
        line: usize,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Notification Errors ===
    /// A notifier failed to deliver a message.
    #[error("notification delivery failed: {message}")]
    Delivery {
        /// Description of the delivery failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for uketsuke operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a missing-field validation error.
    #[must_use]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create an unknown-event error.
    #[must_use]
    pub fn unknown_event(event_id: impl Into<String>) -> Self {
        Self::UnknownEvent {
            event_id: event_id.into(),
        }
    }

    /// Create an unknown-registration error.
    #[must_use]
    pub fn unknown_registration(id: impl Into<String>) -> Self {
        Self::UnknownRegistration { id: id.into() }
    }

    /// Create a duplicate-registration error.
    #[must_use]
    pub fn duplicate_registration(event_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            event_id: event_id.into(),
            email: email.into(),
        }
    }

    /// Create a delivery error.
    #[must_use]
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is an input validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }

    /// Check if this error is a conflict with existing state.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRegistration { .. } | Self::CancelAfterCheckIn { .. }
        )
    }
}
