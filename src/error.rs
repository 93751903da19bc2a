//! Error types for the wizard and capture core

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::capture::CaptureState;
use crate::form::{ErrorCode, Field};

/// Per-field validation failures, one code per invalid field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub BTreeMap<Field, ErrorCode>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<ErrorCode> {
        self.0.get(&field).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = (Field, ErrorCode)> + '_ {
        self.0.iter().map(|(f, c)| (*f, *c))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, code)| format!("{}: {}", field, code))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Audio capture failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Capture device missing, busy, or permission denied
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Operation not valid in the session's current state
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: CaptureState,
    },

    /// Fragment pushed while no recording holds the device
    #[error("Device {0} is not capturing")]
    NotCapturing(String),
}

/// Failures reported by a persistence backend
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Owner ID is required to link the memory")]
    MissingOwner,

    #[error("Memory {0} not found")]
    NotFound(String),

    #[error("Memory {record} belongs to another owner than {owner}")]
    OwnerMismatch { record: String, owner: String },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reasons a wizard submission did not reach or succeed in persistence
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Submission already in progress")]
    AlreadySubmitting,

    #[error("Draft is invalid: {0}")]
    Invalid(ValidationErrors),

    #[error("Could not identify the owner for this memory")]
    MissingOwner,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl SubmitError {
    /// Stable code for the localizer
    pub fn code(&self) -> &'static str {
        match self {
            SubmitError::AlreadySubmitting => "submissionInProgress",
            SubmitError::Invalid(_) => "fixErrorsBeforeSubmitting",
            SubmitError::MissingOwner => "ownerMissing",
            SubmitError::Persistence(_) => "somethingWentWrong",
        }
    }
}
