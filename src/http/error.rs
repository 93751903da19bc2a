use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::error::{CaptureError, PersistenceError, SubmitError};
use crate::form::Field;
use crate::i18n::Localizer;
use crate::session::FieldMessage;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown draft or memory (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request that could not be extracted (bad JSON, path or query)
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Recorder error (409 / 503)
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Store error outside a submission
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Submission refused or failed, with localized text
    #[error("{message}")]
    Submit {
        status: StatusCode,
        code: &'static str,
        message: String,
        fields: BTreeMap<Field, FieldMessage>,
    },
}

impl ApiError {
    pub fn from_submit(err: SubmitError, localizer: &dyn Localizer) -> Self {
        let code = err.code();
        let status = match &err {
            SubmitError::AlreadySubmitting => StatusCode::CONFLICT,
            SubmitError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SubmitError::MissingOwner => StatusCode::BAD_REQUEST,
            SubmitError::Persistence(_) => StatusCode::BAD_GATEWAY,
        };

        let fields = match &err {
            SubmitError::Invalid(errors) => errors
                .fields()
                .map(|(field, code)| {
                    (
                        field,
                        FieldMessage {
                            code: code.as_str().to_string(),
                            message: localizer.resolve(code.as_str()),
                        },
                    )
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        // Store failures show the underlying message so the user knows what to retry
        let message = match &err {
            SubmitError::Persistence(e) => e.to_string(),
            _ => localizer.resolve(code),
        };

        ApiError::Submit {
            status,
            code,
            message,
            fields,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "notFound", msg, BTreeMap::new()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "badRequest", msg, BTreeMap::new()),
            ApiError::Rejected { status, message } => {
                (status, "invalidRequest", message, BTreeMap::new())
            }
            ApiError::Capture(ref err) => {
                let (status, code) = match err {
                    CaptureError::DeviceUnavailable(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "deviceUnavailable")
                    }
                    CaptureError::InvalidState { .. } => (StatusCode::CONFLICT, "invalidState"),
                    CaptureError::NotCapturing(_) => (StatusCode::CONFLICT, "notCapturing"),
                };
                (status, code, err.to_string(), BTreeMap::new())
            }
            ApiError::Persistence(ref err) => {
                let (status, code) = match err {
                    PersistenceError::NotFound(_) => (StatusCode::NOT_FOUND, "notFound"),
                    PersistenceError::MissingOwner => (StatusCode::BAD_REQUEST, "ownerMissing"),
                    PersistenceError::OwnerMismatch { .. } => (StatusCode::CONFLICT, "ownerMismatch"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "storageError"),
                };
                (status, code, err.to_string(), BTreeMap::new())
            }
            ApiError::Submit {
                status,
                code,
                message,
                fields,
            } => (status, code, message, fields),
        };

        let body = if fields.is_empty() {
            json!({ "error": { "code": code, "message": message } })
        } else {
            json!({ "error": { "code": code, "message": message, "fields": fields } })
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
