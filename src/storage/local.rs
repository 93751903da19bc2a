use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{MemoryRecord, Persistence, RecordId};
use crate::error::PersistenceError;
use crate::form::{FormDraft, MediaValue, Upload};
use crate::identity::OwnerId;

const RECORDS_FILE: &str = "memories.json";

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for uploaded assets and the record table
    pub root: PathBuf,
    /// Asset bucket directory under the root
    pub bucket: String,
    /// URL prefix under which the root directory is served
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            bucket: "memories".to_string(),
            public_base_url: "http://127.0.0.1:3000/media".to_string(),
        }
    }
}

/// Filesystem-backed memory store
///
/// Assets are written under `<root>/<bucket>/<owner>/{images,audio}/` and
/// records are kept as a JSON array in `<root>/memories.json`.
pub struct LocalStore {
    config: StorageConfig,
    // Serializes read-modify-write of the record table
    records_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(config: StorageConfig) -> Self {
        info!(
            "Local store at {:?} (bucket: {}, public URL: {})",
            config.root, config.bucket, config.public_base_url
        );

        Self {
            config,
            records_lock: Mutex::new(()),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Directory holding uploaded assets
    pub fn bucket_dir(&self) -> PathBuf {
        self.config.root.join(&self.config.bucket)
    }

    fn records_path(&self) -> PathBuf {
        self.config.root.join(RECORDS_FILE)
    }

    async fn load_records(&self) -> Result<Vec<MemoryRecord>, PersistenceError> {
        match tokio::fs::read(self.records_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_records(&self, records: &[MemoryRecord]) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.config.root).await?;

        // Write then rename so a crash never leaves a truncated table
        let tmp = self.records_path().with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(records)?).await?;
        tokio::fs::rename(&tmp, self.records_path()).await?;
        Ok(())
    }

    /// Fetch a single memory
    pub async fn get(&self, id: &RecordId) -> Result<MemoryRecord, PersistenceError> {
        let _guard = self.records_lock.lock().await;
        self.load_records()
            .await?
            .into_iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }

    /// All memories of one participant, newest first
    pub async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<MemoryRecord>, PersistenceError> {
        let _guard = self.records_lock.lock().await;
        let mut records: Vec<MemoryRecord> = self
            .load_records()
            .await?
            .into_iter()
            .filter(|r| &r.user_id == owner)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Remove a memory record; its uploaded assets are left in the bucket
    pub async fn delete(&self, id: &RecordId) -> Result<MemoryRecord, PersistenceError> {
        let _guard = self.records_lock.lock().await;
        let mut records = self.load_records().await?;

        let index = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
        let removed = records.remove(index);

        self.save_records(&records).await?;
        info!("Deleted memory {} of owner {}", id, removed.user_id);
        Ok(removed)
    }

    /// Upload a payload or pass a reference through
    async fn resolve_media(
        &self,
        value: &MediaValue,
        owner: &OwnerId,
        folder: &str,
    ) -> Result<String, PersistenceError> {
        match value {
            MediaValue::Reference(url) => Ok(url.clone()),
            MediaValue::Payload(upload) => self.upload(upload, owner, folder).await,
        }
    }

    async fn upload(&self, upload: &Upload, owner: &OwnerId, folder: &str) -> Result<String, PersistenceError> {
        let object = format!(
            "{}/{}/{}_{}",
            sanitize(owner.as_str()),
            folder,
            Utc::now().timestamp_millis(),
            sanitize(&upload.file_name)
        );

        let path = self.bucket_dir().join(&object);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &upload.bytes).await?;

        debug!(
            "Uploaded {} ({} bytes, {}) to {:?}",
            upload.file_name,
            upload.bytes.len(),
            upload.media_type,
            path
        );

        Ok(format!(
            "{}/{}/{}",
            self.config.public_base_url.trim_end_matches('/'),
            self.config.bucket,
            object
        ))
    }
}

#[async_trait]
impl Persistence for LocalStore {
    async fn create_or_update(
        &self,
        draft: &FormDraft,
        owner_id: &OwnerId,
    ) -> Result<RecordId, PersistenceError> {
        if owner_id.is_empty() {
            warn!("Refusing to save memory without an owner");
            return Err(PersistenceError::MissingOwner);
        }

        info!("Saving memory for owner {}", owner_id);

        // Held across uploads so an update never races a delete of its record
        let _guard = self.records_lock.lock().await;
        let mut records = self.load_records().await?;

        let existing = match &draft.record_id {
            Some(id) => {
                let index = records
                    .iter()
                    .position(|r| &r.id == id)
                    .ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
                if &records[index].user_id != owner_id {
                    warn!(
                        "Refusing to move memory {} from owner {} to {}",
                        id, records[index].user_id, owner_id
                    );
                    return Err(PersistenceError::OwnerMismatch {
                        record: id.to_string(),
                        owner: owner_id.to_string(),
                    });
                }
                Some(index)
            }
            None => None,
        };

        let image = match &draft.image {
            Some(value) => self.resolve_media(value, owner_id, "images").await?,
            None => String::new(),
        };
        let audio = match &draft.audio {
            Some(value) => Some(self.resolve_media(value, owner_id, "audio").await?),
            None => None,
        };

        let now = Utc::now();

        let id = match existing {
            Some(index) => {
                let record = &mut records[index];
                record.title = draft.title.clone();
                record.description = draft.description.clone();
                record.image = image;
                record.audio = audio;
                record.updated_at = now;
                info!("Updated memory {}", record.id);
                record.id.clone()
            }
            None => {
                let id = RecordId::new_v4();
                records.push(MemoryRecord {
                    id: id.clone(),
                    title: draft.title.clone(),
                    description: draft.description.clone(),
                    image,
                    audio,
                    user_id: owner_id.clone(),
                    created_at: now,
                    updated_at: now,
                });
                info!("Created memory {} for owner {}", id, owner_id);
                id
            }
        };

        self.save_records(&records).await?;
        Ok(id)
    }
}

/// Keep a single path segment: no separators, no parent references
fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn test_sanitize_strips_separators() {
        assert_eq!(sanitize("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize("photo.png"), "photo.png");
        assert_eq!(sanitize(""), "file");
        assert_eq!(sanitize(".."), "file");
    }
}
