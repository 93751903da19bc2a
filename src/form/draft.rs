use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::{MemoryRecord, RecordId};

/// Form fields of a memory draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Image,
    Title,
    Description,
    Audio,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Image => "image",
            Field::Title => "title",
            Field::Description => "description",
            Field::Audio => "audio",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields that accept a binary file selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaField {
    Image,
    Audio,
}

impl From<MediaField> for Field {
    fn from(field: MediaField) -> Self {
        match field {
            MediaField::Image => Field::Image,
            MediaField::Audio => Field::Audio,
        }
    }
}

/// Raw binary payload selected or recorded in the browser, not yet uploaded
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

// Payloads can be megabytes; keep them out of debug logs.
impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Media slot value: an unsaved payload or a reference to an already stored asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaValue {
    Payload(Upload),
    Reference(String),
}

impl MediaValue {
    pub fn reference(url: impl Into<String>) -> Self {
        MediaValue::Reference(url.into())
    }

    /// Whether the value carries something (non-empty bytes or non-blank URL)
    pub fn is_present(&self) -> bool {
        match self {
            MediaValue::Payload(upload) => !upload.bytes.is_empty(),
            MediaValue::Reference(url) => !url.trim().is_empty(),
        }
    }
}

/// The in-progress memory built by the wizard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    pub image: Option<MediaValue>,
    pub title: String,
    pub description: String,
    pub audio: Option<MediaValue>,
    /// Set when editing an existing memory
    pub record_id: Option<RecordId>,
}

impl FormDraft {
    /// Pre-populate a draft from a stored memory (edit mode)
    pub fn from_record(record: &MemoryRecord) -> Self {
        Self {
            image: Some(MediaValue::Reference(record.image.clone())),
            title: record.title.clone(),
            description: record.description.clone(),
            audio: record.audio.clone().map(MediaValue::Reference),
            record_id: Some(record.id.clone()),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.record_id.is_some()
    }
}

/// A single-field change, tagged with the field it targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Image(Option<MediaValue>),
    Title(String),
    Description(String),
    Audio(Option<MediaValue>),
}

impl FieldUpdate {
    pub fn field(&self) -> Field {
        match self {
            FieldUpdate::Image(_) => Field::Image,
            FieldUpdate::Title(_) => Field::Title,
            FieldUpdate::Description(_) => Field::Description,
            FieldUpdate::Audio(_) => Field::Audio,
        }
    }

    pub(crate) fn apply(self, draft: &mut FormDraft) {
        match self {
            FieldUpdate::Image(value) => draft.image = value,
            FieldUpdate::Title(value) => draft.title = value,
            FieldUpdate::Description(value) => draft.description = value,
            FieldUpdate::Audio(value) => draft.audio = value,
        }
    }
}
