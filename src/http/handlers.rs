use super::error::{ApiError, ApiResult};
use super::extract::{JsonBody, PathParams, QueryParams};
use super::state::AppState;
use crate::form::{FieldUpdate, MediaField, MediaValue, Notice, Upload};
use crate::i18n::Localizer;
use crate::identity::{OwnerId, SessionContext};
use crate::session::{DraftSession, DraftStatus};
use crate::storage::{MemoryRecord, RecordId};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateDraftRequest {
    /// Memory to edit; omitted for a new memory
    pub record_id: Option<RecordId>,
}

#[derive(Debug, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FieldsPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Reference to an already stored image
    pub image_url: Option<String>,
    #[serde(default)]
    pub remove_image: bool,
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    /// Whether the step gate passed
    pub advanced: bool,
    pub draft: DraftStatus,
}

#[derive(Debug, Serialize)]
pub struct FragmentResponse {
    pub accepted: bool,
    pub fragments: usize,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub bytes: usize,
    pub draft: DraftStatus,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub record_id: RecordId,
    pub owner_id: String,
    pub notice: String,
    pub message: String,
    /// Where the UI goes next
    pub navigate_to: String,
}

#[derive(Debug, Deserialize)]
pub struct MemoriesQuery {
    pub owner: String,
}

#[derive(Debug, Serialize)]
pub struct MemoryListResponse {
    pub owner_id: OwnerId,
    pub memories: Vec<MemoryRecord>,
}

#[derive(Debug, Serialize)]
pub struct DeleteMemoryResponse {
    pub record_id: RecordId,
    pub notice: String,
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// POST /drafts
/// Open a wizard for a new memory, or for editing one when `record_id` is given
pub async fn create_draft(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LocaleQuery>,
    body: Option<JsonBody<CreateDraftRequest>>,
) -> ApiResult<impl IntoResponse> {
    let req = body.map(|JsonBody(req)| req).unwrap_or_default();

    let session = match req.record_id {
        Some(record_id) => {
            let record = state.store.get(&record_id).await?;
            DraftSession::edit(&record, &state.capture)
        }
        None => DraftSession::new(&state.capture),
    };

    let id = session.id();
    let status = session.status(&state.localizer(&query.locale));

    state
        .drafts
        .write()
        .await
        .insert(id, Arc::new(Mutex::new(session)));

    info!("Draft {} opened", id);
    Ok((StatusCode::CREATED, Json(status)))
}

/// GET /drafts/:draft_id
pub async fn get_draft(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
) -> ApiResult<Json<DraftStatus>> {
    let draft = state.draft(draft_id).await?;
    let session = draft.lock().await;
    Ok(Json(session.status(&state.localizer(&query.locale))))
}

/// DELETE /drafts/:draft_id
/// Navigate away: drop the draft and release its recorder
pub async fn delete_draft(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
) -> ApiResult<StatusCode> {
    let removed = state.drafts.write().await.remove(&draft_id);
    match removed {
        Some(draft) => {
            draft.lock().await.capture_mut().discard();
            info!("Draft {} closed", draft_id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound(format!("Draft {} not found", draft_id))),
    }
}

/// PATCH /drafts/:draft_id/fields
pub async fn update_fields(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
    JsonBody(patch): JsonBody<FieldsPatch>,
) -> ApiResult<Json<DraftStatus>> {
    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;
    let wizard = session.wizard_mut();

    if let Some(title) = patch.title {
        wizard.update_field(FieldUpdate::Title(title));
    }
    if let Some(description) = patch.description {
        wizard.update_field(FieldUpdate::Description(description));
    }
    if patch.remove_image {
        wizard.update_field(FieldUpdate::Image(None));
    } else if let Some(url) = patch.image_url {
        wizard.update_field(FieldUpdate::Image(Some(MediaValue::Reference(url))));
    }

    Ok(Json(session.status(&state.localizer(&query.locale))))
}

/// PUT /drafts/:draft_id/files/:field
/// Attach a raw file (image or audio) from the request body
pub async fn upload_file(
    State(state): State<AppState>,
    PathParams((draft_id, field)): PathParams<(Uuid, MediaField)>,
    QueryParams(query): QueryParams<LocaleQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<DraftStatus>> {
    let media_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let file_name = headers
        .get("x-file-name")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("upload")
        .to_string();

    // Same filter as the browser's file picker
    let expected = match field {
        MediaField::Image => "image/",
        MediaField::Audio => "audio/",
    };
    if headers.contains_key(header::CONTENT_TYPE) && !media_type.starts_with(expected) {
        return Err(ApiError::BadRequest(format!(
            "{} is not an accepted {} type",
            media_type,
            crate::form::Field::from(field)
        )));
    }

    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;

    // An empty body is an empty selection and leaves the draft unchanged
    let upload = (!body.is_empty()).then(|| Upload::new(file_name, media_type, body.to_vec()));
    session.wizard_mut().handle_file_select(field, upload);

    Ok(Json(session.status(&state.localizer(&query.locale))))
}

/// POST /drafts/:draft_id/advance
pub async fn advance(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
) -> ApiResult<Json<StepResponse>> {
    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;
    let advanced = session.wizard_mut().advance();

    Ok(Json(StepResponse {
        advanced,
        draft: session.status(&state.localizer(&query.locale)),
    }))
}

/// POST /drafts/:draft_id/retreat
pub async fn retreat(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
) -> ApiResult<Json<StepResponse>> {
    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;
    session.wizard_mut().retreat();

    Ok(Json(StepResponse {
        advanced: false,
        draft: session.status(&state.localizer(&query.locale)),
    }))
}

/// POST /drafts/:draft_id/recording/start
pub async fn start_recording(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
) -> ApiResult<Json<DraftStatus>> {
    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;
    session.capture_mut().start().await?;
    Ok(Json(session.status(&state.localizer(&query.locale))))
}

/// POST /drafts/:draft_id/recording/pause
pub async fn pause_recording(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
) -> ApiResult<Json<DraftStatus>> {
    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;
    session.capture_mut().pause()?;
    Ok(Json(session.status(&state.localizer(&query.locale))))
}

/// POST /drafts/:draft_id/recording/resume
pub async fn resume_recording(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
) -> ApiResult<Json<DraftStatus>> {
    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;
    session.capture_mut().resume()?;
    Ok(Json(session.status(&state.localizer(&query.locale))))
}

/// POST /drafts/:draft_id/recording/stop
/// Finish the recording and attach it as the draft's audio
pub async fn stop_recording(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
) -> ApiResult<Json<StopRecordingResponse>> {
    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;
    let bytes = session.stop_recording().await?;

    Ok(Json(StopRecordingResponse {
        bytes,
        draft: session.status(&state.localizer(&query.locale)),
    }))
}

/// POST /drafts/:draft_id/recording/discard
pub async fn discard_recording(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
) -> ApiResult<Json<DraftStatus>> {
    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;
    session.capture_mut().discard();
    Ok(Json(session.status(&state.localizer(&query.locale))))
}

/// POST /drafts/:draft_id/recording/fragments
/// One recorder chunk from the browser
pub async fn push_fragment(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    body: Bytes,
) -> ApiResult<Json<FragmentResponse>> {
    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;
    let accepted = session.push_fragment(body.to_vec()).await?;

    Ok(Json(FragmentResponse {
        accepted,
        fragments: session.capture().fragment_count(),
    }))
}

/// DELETE /drafts/:draft_id/audio
pub async fn delete_audio(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
) -> ApiResult<Json<DraftStatus>> {
    let draft = state.draft(draft_id).await?;
    let mut session = draft.lock().await;
    session.delete_audio();
    Ok(Json(session.status(&state.localizer(&query.locale))))
}

/// POST /drafts/:draft_id/submit
/// Save the memory for the owner named by the request's session context
pub async fn submit(
    State(state): State<AppState>,
    PathParams(draft_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<LocaleQuery>,
    JsonBody(context): JsonBody<SessionContext>,
) -> ApiResult<Json<SubmitResponse>> {
    let localizer = state.localizer(&query.locale);
    let draft = state.draft(draft_id).await?;

    // The draft stays unlocked while the store works; a second submit in
    // that window is refused by the submitting flag
    let pending = {
        let mut session = draft.lock().await;
        session
            .wizard_mut()
            .begin_submit(&context)
            .map_err(|e| ApiError::from_submit(e, &localizer))?
    };

    let result = pending.run(state.store.as_ref()).await;

    let (receipt, navigation) = {
        let mut session = draft.lock().await;
        let wizard = session.wizard_mut();
        let receipt = wizard
            .complete_submit(result)
            .map_err(|e| ApiError::from_submit(e, &localizer))?;
        (receipt, wizard.take_navigation())
    };

    if navigation.is_some() {
        state.drafts.write().await.remove(&draft_id);
        info!("Draft {} submitted and closed", draft_id);
    }

    let message = match &receipt.notice {
        Notice::MemoryCreatedFor(name) => localizer
            .resolve(receipt.notice.code())
            .replace("{name}", name),
        notice => localizer.resolve(notice.code()),
    };

    Ok(Json(SubmitResponse {
        record_id: receipt.record_id,
        owner_id: receipt.owner_id.to_string(),
        notice: receipt.notice.code().to_string(),
        message,
        navigate_to: "/view".to_string(),
    }))
}

/// GET /memories?owner=
/// A participant's memories, newest first
pub async fn list_memories(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<MemoriesQuery>,
) -> ApiResult<Json<MemoryListResponse>> {
    let owner_id = OwnerId::new(query.owner.trim());
    if owner_id.is_empty() {
        return Err(ApiError::BadRequest("owner must not be empty".to_string()));
    }

    let memories = state.store.list_for_owner(&owner_id).await?;

    Ok(Json(MemoryListResponse { owner_id, memories }))
}

/// DELETE /memories/:record_id
pub async fn delete_memory(
    State(state): State<AppState>,
    PathParams(record_id): PathParams<RecordId>,
    QueryParams(query): QueryParams<LocaleQuery>,
) -> ApiResult<Json<DeleteMemoryResponse>> {
    let removed = state.store.delete(&record_id).await?;

    let notice = "memoryDeleted";
    Ok(Json(DeleteMemoryResponse {
        record_id: removed.id,
        notice: notice.to_string(),
        message: state.localizer(&query.locale).resolve(notice),
    }))
}
