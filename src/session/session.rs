use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::stats::{CaptureStatus, DraftStatus, FieldMessage, MediaSummary};
use crate::capture::{build_device, CaptureConfig, CaptureSession, FragmentFeed};
use crate::error::CaptureError;
use crate::form::{MediaField, MediaValue, WizardController};
use crate::i18n::Localizer;
use crate::storage::MemoryRecord;

/// One browser tab's wizard: the form controller plus its audio recorder
pub struct DraftSession {
    id: Uuid,
    wizard: WizardController,
    capture: CaptureSession,
    /// Present when the recorder is fed by fragment uploads
    feed: Option<FragmentFeed>,
    created_at: DateTime<Utc>,
}

impl DraftSession {
    /// Draft for a new memory
    pub fn new(config: &CaptureConfig) -> Self {
        Self::with_wizard(WizardController::new(), config)
    }

    /// Draft pre-populated from a stored memory
    pub fn edit(record: &MemoryRecord, config: &CaptureConfig) -> Self {
        let draft = crate::form::FormDraft::from_record(record);
        Self::with_wizard(WizardController::with_draft(draft), config)
    }

    fn with_wizard(wizard: WizardController, config: &CaptureConfig) -> Self {
        let id = Uuid::new_v4();
        let (device, feed) = build_device(config, &format!("recorder-{}", id));

        info!(
            "Created draft session {} ({})",
            id,
            if wizard.is_editing() { "edit" } else { "new" }
        );

        Self {
            id,
            wizard,
            capture: CaptureSession::new(device, config.clone()),
            feed,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn wizard(&self) -> &WizardController {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut WizardController {
        &mut self.wizard
    }

    pub fn capture(&self) -> &CaptureSession {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut CaptureSession {
        &mut self.capture
    }

    /// Deliver one recorder chunk uploaded by the browser
    pub async fn push_fragment(&mut self, bytes: Vec<u8>) -> Result<bool, CaptureError> {
        let Some(feed) = self.feed.clone() else {
            return Err(CaptureError::NotCapturing(self.capture.device_name().to_string()));
        };

        // Make room in the device channel before pushing
        self.capture.collect_pending();
        let accepted = feed.push(bytes).await?;
        self.capture.collect_pending();
        Ok(accepted)
    }

    /// Stop recording and store the artifact as the draft's audio
    pub async fn stop_recording(&mut self) -> Result<usize, CaptureError> {
        let artifact = self.capture.stop().await?;
        let size = artifact.bytes.len();
        self.wizard
            .handle_file_select(MediaField::Audio, Some(artifact.into_upload()));
        Ok(size)
    }

    /// Throw away the recording and any audio already attached
    pub fn delete_audio(&mut self) {
        self.capture.discard();
        self.wizard.clear_audio();
    }

    /// Snapshot for the UI, with error codes resolved to display text
    pub fn status(&self, localizer: &dyn Localizer) -> DraftStatus {
        let draft = self.wizard.draft();

        let errors = self
            .wizard
            .errors()
            .iter()
            .map(|(field, code)| {
                (
                    *field,
                    FieldMessage {
                        code: code.as_str().to_string(),
                        message: localizer.resolve(code.as_str()),
                    },
                )
            })
            .collect();

        DraftStatus {
            id: self.id,
            current_step: self.wizard.current_step(),
            total_steps: self.wizard.total_steps(),
            editing: draft.record_id.clone(),
            submitting: self.wizard.is_submitting(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            image: draft.image.as_ref().map(summarize),
            audio: draft.audio.as_ref().map(summarize),
            errors,
            capture: CaptureStatus {
                state: self.capture.state(),
                fragments: self.capture.fragment_count(),
                bytes: self.capture.recorded_bytes(),
            },
            created_at: self.created_at,
        }
    }
}

fn summarize(value: &MediaValue) -> MediaSummary {
    match value {
        MediaValue::Payload(upload) => MediaSummary::Payload {
            file_name: upload.file_name.clone(),
            media_type: upload.media_type.clone(),
            size: upload.bytes.len(),
        },
        MediaValue::Reference(url) => MediaSummary::Reference { url: url.clone() },
    }
}
