// Integration tests for the memory wizard
//
// These tests drive WizardController through its step gates and submission
// against an in-memory persistence double.

use async_trait::async_trait;
use memory_journal::form::{Navigation, Notice, TOTAL_STEPS};
use memory_journal::{
    ErrorCode, Field, FieldUpdate, FormDraft, MediaField, MediaValue, OwnerId, Participant,
    Persistence, PersistenceError, RecordId, SessionContext, SubmitError, Upload, WizardController,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct RecordingPersistence {
    calls: Mutex<Vec<(FormDraft, OwnerId)>>,
    fail: AtomicBool,
}

impl RecordingPersistence {
    fn failing() -> Self {
        let p = Self::default();
        p.fail.store(true, Ordering::SeqCst);
        p
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Persistence for RecordingPersistence {
    async fn create_or_update(
        &self,
        draft: &FormDraft,
        owner_id: &OwnerId,
    ) -> Result<RecordId, PersistenceError> {
        self.calls
            .lock()
            .unwrap()
            .push((draft.clone(), owner_id.clone()));

        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "storage offline",
            )));
        }

        Ok(draft
            .record_id
            .clone()
            .unwrap_or_else(|| RecordId("m-1".to_string())))
    }
}

fn image() -> Upload {
    Upload::new("beach.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47])
}

fn filled_wizard() -> WizardController {
    let mut wizard = WizardController::new();
    wizard.update_field(FieldUpdate::Image(Some(MediaValue::reference("https://cdn/x.png"))));
    wizard.update_field(FieldUpdate::Title("Beach Trip".to_string()));
    wizard.update_field(FieldUpdate::Description(
        "We walked along the shore for hours.".to_string(),
    ));
    wizard
}

#[test]
fn test_new_wizard_starts_at_step_one() {
    let wizard = WizardController::new();

    assert_eq!(wizard.current_step(), 1);
    assert_eq!(wizard.total_steps(), TOTAL_STEPS);
    assert!(wizard.errors().is_empty());
    assert!(!wizard.is_submitting());
    assert!(!wizard.is_editing());
}

#[test]
fn test_advance_blocked_without_image() {
    let mut wizard = WizardController::new();

    assert!(!wizard.advance());
    assert_eq!(wizard.current_step(), 1);
    assert_eq!(wizard.error(Field::Image), Some(ErrorCode::ImageRequired));
}

#[test]
fn test_file_select_unblocks_step_one() {
    let mut wizard = WizardController::new();
    wizard.advance();

    wizard.handle_file_select(MediaField::Image, Some(image()));
    assert_eq!(wizard.error(Field::Image), None, "selecting a file clears the error");

    assert!(wizard.advance());
    assert_eq!(wizard.current_step(), 2);
    assert!(wizard.errors().is_empty());
}

#[test]
fn test_empty_file_selection_is_ignored() {
    let mut wizard = WizardController::new();
    wizard.handle_file_select(MediaField::Image, Some(image()));
    wizard.handle_file_select(MediaField::Image, None);

    assert!(matches!(wizard.draft().image, Some(MediaValue::Payload(_))));
}

#[test]
fn test_short_title_blocks_step_two_without_touching_description() {
    let mut wizard = WizardController::new();
    wizard.handle_file_select(MediaField::Image, Some(image()));
    assert!(wizard.advance());

    wizard.update_field(FieldUpdate::Title("Ab".to_string()));
    wizard.update_field(FieldUpdate::Description("0123456789".to_string()));

    assert!(!wizard.validate_step(2));
    assert_eq!(wizard.error(Field::Title), Some(ErrorCode::TitleMinLength));
    assert_eq!(wizard.error(Field::Description), None);

    assert!(!wizard.advance());
    assert_eq!(wizard.current_step(), 2);
}

#[test]
fn test_advance_stops_at_last_step() {
    let mut wizard = filled_wizard();

    for _ in 0..5 {
        wizard.advance();
    }

    assert_eq!(wizard.current_step(), TOTAL_STEPS);
}

#[test]
fn test_retreat_ignores_validation_and_stops_at_one() {
    let mut wizard = filled_wizard();
    wizard.advance();
    wizard.advance();
    assert_eq!(wizard.current_step(), 3);

    // Break step two, then walk back through it
    wizard.update_field(FieldUpdate::Title(String::new()));
    assert!(!wizard.validate_step(2));

    wizard.retreat();
    assert_eq!(wizard.current_step(), 2);
    wizard.retreat();
    assert_eq!(wizard.current_step(), 1);
    wizard.retreat();
    assert_eq!(wizard.current_step(), 1);
}

#[test]
fn test_update_field_clears_only_that_error() {
    let mut wizard = WizardController::new();
    assert!(!wizard.validate_step(2));
    assert_eq!(wizard.error(Field::Title), Some(ErrorCode::TitleRequired));
    assert_eq!(wizard.error(Field::Description), Some(ErrorCode::DescriptionRequired));

    wizard.update_field(FieldUpdate::Title("x".to_string()));

    assert_eq!(wizard.error(Field::Title), None);
    assert_eq!(
        wizard.error(Field::Description),
        Some(ErrorCode::DescriptionRequired)
    );
}

#[test]
fn test_clear_audio_removes_recording() {
    let mut wizard = filled_wizard();
    wizard.handle_file_select(
        MediaField::Audio,
        Some(Upload::new("audio.webm", "audio/webm", vec![1, 2, 3])),
    );
    assert!(wizard.draft().audio.is_some());

    wizard.clear_audio();
    assert!(wizard.draft().audio.is_none());
}

#[tokio::test]
async fn test_submit_calls_persistence_once_and_navigates() {
    let persistence = RecordingPersistence::default();
    let mut wizard = filled_wizard();
    let expected_draft = wizard.draft().clone();

    let receipt = wizard
        .submit(&SessionContext::participant("u-1"), &persistence)
        .await
        .expect("submit should succeed");

    assert_eq!(receipt.record_id, RecordId("m-1".to_string()));
    assert_eq!(receipt.owner_id, OwnerId::new("u-1"));
    assert_eq!(receipt.notice, Notice::MemoryCreated);

    let calls = persistence.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, expected_draft);
    assert_eq!(calls[0].1, OwnerId::new("u-1"));
    drop(calls);

    assert!(!wizard.is_submitting());
    assert_eq!(wizard.take_navigation(), Some(Navigation::ViewMemories));
    assert_eq!(wizard.take_navigation(), None, "navigation fires once");
}

#[tokio::test]
async fn test_submit_while_submitting_is_rejected() {
    let persistence = RecordingPersistence::default();
    let mut wizard = filled_wizard();
    let ctx = SessionContext::participant("u-1");

    let pending = wizard.begin_submit(&ctx).unwrap();
    assert!(wizard.is_submitting());

    let draft_before = wizard.draft().clone();
    let step_before = wizard.current_step();
    let errors_before = wizard.errors().clone();

    let second = wizard.submit(&ctx, &persistence).await;
    assert!(matches!(second, Err(SubmitError::AlreadySubmitting)));
    assert_eq!(persistence.call_count(), 0);
    assert_eq!(wizard.draft(), &draft_before);
    assert_eq!(wizard.current_step(), step_before);
    assert_eq!(wizard.errors(), &errors_before);

    let result = pending.run(&persistence).await;
    assert!(!wizard.is_submitting());
    assert!(wizard.complete_submit(result).is_ok());
    assert_eq!(persistence.call_count(), 1);
}

#[tokio::test]
async fn test_dropped_pending_submit_resets_flag() {
    let mut wizard = filled_wizard();

    let pending = wizard
        .begin_submit(&SessionContext::participant("u-1"))
        .unwrap();
    assert!(wizard.is_submitting());

    drop(pending);
    assert!(!wizard.is_submitting());
}

#[tokio::test]
async fn test_invalid_draft_never_reaches_persistence() {
    let persistence = RecordingPersistence::default();
    let mut wizard = WizardController::new();
    wizard.update_field(FieldUpdate::Title("Beach Trip".to_string()));

    let result = wizard
        .submit(&SessionContext::participant("u-1"), &persistence)
        .await;

    match result {
        Err(SubmitError::Invalid(errors)) => {
            assert_eq!(errors.get(Field::Image), Some(ErrorCode::ImageRequired));
            assert_eq!(
                errors.get(Field::Description),
                Some(ErrorCode::DescriptionRequired)
            );
            assert_eq!(errors.get(Field::Title), None);
        }
        other => panic!("expected validation failure, got {:?}", other),
    }

    assert_eq!(persistence.call_count(), 0);
    assert!(!wizard.is_submitting());
    assert_eq!(wizard.error(Field::Image), Some(ErrorCode::ImageRequired));
    assert_eq!(wizard.take_navigation(), None);
}

#[tokio::test]
async fn test_missing_owner_aborts_submission() {
    let persistence = RecordingPersistence::default();
    let mut wizard = filled_wizard();

    let result = wizard
        .submit(&SessionContext::supporter("a-1", None), &persistence)
        .await;

    assert!(matches!(result, Err(SubmitError::MissingOwner)));
    assert_eq!(persistence.call_count(), 0);
    assert!(!wizard.is_submitting());
}

#[tokio::test]
async fn test_persistence_failure_keeps_draft_for_retry() {
    let persistence = RecordingPersistence::failing();
    let mut wizard = filled_wizard();
    let draft_before = wizard.draft().clone();
    let ctx = SessionContext::participant("u-1");

    let result = wizard.submit(&ctx, &persistence).await;
    assert!(matches!(result, Err(SubmitError::Persistence(_))));
    assert_eq!(wizard.draft(), &draft_before);
    assert!(!wizard.is_submitting());
    assert_eq!(wizard.take_navigation(), None);

    persistence.fail.store(false, Ordering::SeqCst);
    assert!(wizard.submit(&ctx, &persistence).await.is_ok());
    assert_eq!(persistence.call_count(), 2);
}

#[tokio::test]
async fn test_supporter_creates_for_selected_participant() {
    let persistence = RecordingPersistence::default();
    let mut wizard = filled_wizard();
    let ctx = SessionContext::supporter(
        "a-1",
        Some(Participant {
            id: OwnerId::new("u-7"),
            full_name: "Rosa".to_string(),
        }),
    );

    let receipt = wizard.submit(&ctx, &persistence).await.unwrap();

    assert_eq!(receipt.owner_id, OwnerId::new("u-7"));
    assert_eq!(receipt.notice, Notice::MemoryCreatedFor("Rosa".to_string()));
}

#[tokio::test]
async fn test_edit_mode_updates_existing_record() {
    let persistence = RecordingPersistence::default();
    let draft = FormDraft {
        image: Some(MediaValue::reference("https://cdn/x.png")),
        title: "Beach Trip".to_string(),
        description: "We walked along the shore for hours.".to_string(),
        audio: None,
        record_id: Some(RecordId("m-42".to_string())),
    };
    let mut wizard = WizardController::with_draft(draft);
    assert!(wizard.is_editing());

    wizard.update_field(FieldUpdate::Title("Beach Day".to_string()));
    let receipt = wizard.submit(&OwnerId::new("u-1"), &persistence).await.unwrap();

    assert_eq!(receipt.record_id, RecordId("m-42".to_string()));
    assert_eq!(receipt.notice, Notice::MemoryUpdated);
    assert_eq!(persistence.calls.lock().unwrap()[0].0.title, "Beach Day");
}
