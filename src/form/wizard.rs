use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::draft::{Field, FieldUpdate, FormDraft, MediaField, MediaValue, Upload};
use super::validation::{self, ErrorCode};
use crate::error::{PersistenceError, SubmitError};
use crate::identity::{IdentityResolver, OwnerId};
use crate::storage::{Persistence, RecordId};

/// Number of wizard steps: image, text, audio
pub const TOTAL_STEPS: u8 = 3;

/// Step position, field errors and the submission flag
#[derive(Debug)]
pub struct WizardState {
    current_step: u8,
    errors: BTreeMap<Field, ErrorCode>,
    submitting: Arc<AtomicBool>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: 1,
            errors: BTreeMap::new(),
            submitting: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Where the UI should go after a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    ViewMemories,
}

/// Success message shown after submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MemoryCreated,
    /// Supporter created a memory for the named participant
    MemoryCreatedFor(String),
    MemoryUpdated,
}

impl Notice {
    pub fn code(&self) -> &'static str {
        match self {
            Notice::MemoryCreated => "memoryCreated",
            Notice::MemoryCreatedFor(_) => "memoryCreatedFor",
            Notice::MemoryUpdated => "memoryUpdated",
        }
    }
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub record_id: RecordId,
    pub owner_id: OwnerId,
    pub notice: Notice,
}

/// Clears the submitting flag when dropped, on every exit path
struct SubmittingGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SubmittingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// A submission that passed validation and owner resolution
///
/// Holds a snapshot of the draft so the controller can be unlocked while
/// persistence runs. The controller's submitting flag stays set until this
/// value is consumed or dropped.
pub struct PendingSubmit {
    draft: FormDraft,
    owner_id: OwnerId,
    acting_for: Option<String>,
    _guard: SubmittingGuard,
}

impl PendingSubmit {
    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    /// Call persistence once and build the receipt
    pub async fn run<P>(self, persistence: &P) -> Result<SubmitReceipt, PersistenceError>
    where
        P: Persistence + ?Sized,
    {
        let record_id = persistence
            .create_or_update(&self.draft, &self.owner_id)
            .await?;

        let notice = if self.draft.is_edit() {
            Notice::MemoryUpdated
        } else {
            match self.acting_for {
                Some(name) => Notice::MemoryCreatedFor(name),
                None => Notice::MemoryCreated,
            }
        };

        Ok(SubmitReceipt {
            record_id,
            owner_id: self.owner_id,
            notice,
        })
    }
}

/// Drives the three-step memory wizard
///
/// Owns the draft exclusively; every mutation goes through `update_field`
/// or `handle_file_select`, which clear the error of the changed field.
#[derive(Debug, Default)]
pub struct WizardController {
    draft: FormDraft,
    state: WizardState,
    navigation: Option<Navigation>,
}

impl WizardController {
    /// Start a wizard for a new memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a wizard pre-populated with an existing draft (edit mode)
    pub fn with_draft(draft: FormDraft) -> Self {
        Self {
            draft,
            ..Self::default()
        }
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn current_step(&self) -> u8 {
        self.state.current_step
    }

    pub fn total_steps(&self) -> u8 {
        TOTAL_STEPS
    }

    pub fn errors(&self) -> &BTreeMap<Field, ErrorCode> {
        &self.state.errors
    }

    pub fn error(&self, field: Field) -> Option<ErrorCode> {
        self.state.errors.get(&field).copied()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.submitting.load(Ordering::SeqCst)
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_edit()
    }

    /// Merge one field into the draft and clear that field's error
    pub fn update_field(&mut self, update: FieldUpdate) {
        let field = update.field();
        update.apply(&mut self.draft);
        self.state.errors.remove(&field);
    }

    /// Store a raw file under a media field; an empty selection is ignored
    pub fn handle_file_select(&mut self, field: MediaField, file: Option<Upload>) {
        let Some(upload) = file else {
            return;
        };
        let value = Some(MediaValue::Payload(upload));
        let update = match field {
            MediaField::Image => FieldUpdate::Image(value),
            MediaField::Audio => FieldUpdate::Audio(value),
        };
        self.update_field(update);
    }

    /// Drop the recorded or attached audio
    pub fn clear_audio(&mut self) {
        self.update_field(FieldUpdate::Audio(None));
    }

    /// Run the gate of `step`; replaces `errors` with the outcome
    pub fn validate_step(&mut self, step: u8) -> bool {
        match validation::validate_step(&self.draft, step) {
            Ok(()) => {
                self.state.errors.clear();
                true
            }
            Err(errors) => {
                self.state.errors = errors.0;
                false
            }
        }
    }

    /// Move forward if the current step validates
    pub fn advance(&mut self) -> bool {
        if !self.validate_step(self.state.current_step) {
            return false;
        }
        if self.state.current_step < TOTAL_STEPS {
            self.state.current_step += 1;
        }
        true
    }

    /// Move back one step, without validation
    pub fn retreat(&mut self) {
        if self.state.current_step > 1 {
            self.state.current_step -= 1;
        }
    }

    /// Validate the whole draft, resolve its owner and mark the wizard as submitting
    pub fn begin_submit<I>(&mut self, identity: &I) -> Result<PendingSubmit, SubmitError>
    where
        I: IdentityResolver + ?Sized,
    {
        if self.is_submitting() {
            warn!("Ignoring submit: a submission is already in progress");
            return Err(SubmitError::AlreadySubmitting);
        }

        if let Err(errors) = validation::validate_draft(&self.draft) {
            info!("Submit rejected by validation: {}", errors);
            self.state.errors = errors.0.clone();
            return Err(SubmitError::Invalid(errors));
        }

        let Some(owner_id) = identity.current_owner_id().filter(|id| !id.is_empty()) else {
            warn!("Submit aborted: no owner for this memory");
            return Err(SubmitError::MissingOwner);
        };

        self.state.submitting.store(true, Ordering::SeqCst);

        Ok(PendingSubmit {
            draft: self.draft.clone(),
            owner_id,
            acting_for: identity.acting_for(),
            _guard: SubmittingGuard {
                flag: Arc::clone(&self.state.submitting),
            },
        })
    }

    /// Record the outcome of a pending submission
    ///
    /// On success the navigation signal fires; on failure the draft is kept
    /// for a retry.
    pub fn complete_submit(
        &mut self,
        result: Result<SubmitReceipt, PersistenceError>,
    ) -> Result<SubmitReceipt, SubmitError> {
        match result {
            Ok(receipt) => {
                info!(
                    "Memory {} saved for owner {}",
                    receipt.record_id, receipt.owner_id
                );
                self.navigation = Some(Navigation::ViewMemories);
                Ok(receipt)
            }
            Err(e) => {
                error!("Failed to save memory: {}", e);
                Err(SubmitError::Persistence(e))
            }
        }
    }

    /// Validate, resolve the owner and persist the draft
    pub async fn submit<I, P>(
        &mut self,
        identity: &I,
        persistence: &P,
    ) -> Result<SubmitReceipt, SubmitError>
    where
        I: IdentityResolver + ?Sized,
        P: Persistence + ?Sized,
    {
        let pending = self.begin_submit(identity)?;
        let result = pending.run(persistence).await;
        self.complete_submit(result)
    }

    /// Take the navigation-away signal; yields it at most once
    pub fn take_navigation(&mut self) -> Option<Navigation> {
        self.navigation.take()
    }
}
