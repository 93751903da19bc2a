use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::capture::CaptureState;
use crate::form::Field;
use crate::storage::RecordId;

/// Snapshot of a draft session for the UI
#[derive(Debug, Clone, Serialize)]
pub struct DraftStatus {
    pub id: Uuid,

    /// Current wizard step (1-based)
    pub current_step: u8,

    pub total_steps: u8,

    /// Memory being edited, if any
    pub editing: Option<RecordId>,

    pub submitting: bool,

    pub title: String,

    pub description: String,

    pub image: Option<MediaSummary>,

    pub audio: Option<MediaSummary>,

    /// Field errors of the last failed gate
    pub errors: BTreeMap<Field, FieldMessage>,

    pub capture: CaptureStatus,

    pub created_at: DateTime<Utc>,
}

/// A media slot without its bytes
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaSummary {
    Payload {
        file_name: String,
        media_type: String,
        size: usize,
    },
    Reference {
        url: String,
    },
}

/// A field error with its localized text
#[derive(Debug, Clone, Serialize)]
pub struct FieldMessage {
    pub code: String,
    pub message: String,
}

/// Recorder state
#[derive(Debug, Clone, Serialize)]
pub struct CaptureStatus {
    pub state: CaptureState,
    pub fragments: usize,
    pub bytes: usize,
}
