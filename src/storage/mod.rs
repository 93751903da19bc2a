//! Memory persistence
//!
//! `Persistence` is the contract the wizard submits through: upload any
//! unsaved payloads, resolve them to stable references and write one memory
//! record. `LocalStore` implements it on the local filesystem.

mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PersistenceError;
use crate::form::FormDraft;
use crate::identity::OwnerId;

pub use local::{LocalStore, StorageConfig};

/// Identifier of a stored memory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored memory row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    /// Public URL of the image
    pub image: String,
    /// Public URL of the recorded audio, if any
    pub audio: Option<String>,
    pub user_id: OwnerId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create-or-update backend for submitted drafts
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Upload payloads and write the record; updates when the draft carries a record ID
    async fn create_or_update(
        &self,
        draft: &FormDraft,
        owner_id: &OwnerId,
    ) -> Result<RecordId, PersistenceError>;
}
