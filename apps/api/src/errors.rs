use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::review::reason::ReasonError;
use crate::review::workbench::WorkbenchError;
use crate::screening_client::ClientError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend error: {0}")]
    Backend(#[from] ClientError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ReasonError> for AppError {
    fn from(err: ReasonError) -> Self {
        match err {
            ReasonError::NotOpen | ReasonError::CancelRefused => {
                AppError::Conflict(err.to_string())
            }
            ReasonError::RequiredTooShort
            | ReasonError::OptionalTooShort
            | ReasonError::UnknownTemplate { .. } => AppError::UnprocessableEntity(err.to_string()),
        }
    }
}

impl From<WorkbenchError> for AppError {
    fn from(err: WorkbenchError) -> Self {
        match err {
            WorkbenchError::UnknownCandidate(_) | WorkbenchError::NoDraft(_) => {
                AppError::NotFound(err.to_string())
            }
            WorkbenchError::DuplicateCandidate(_) | WorkbenchError::NothingToSubmit => {
                AppError::Validation(err.to_string())
            }
            WorkbenchError::SubmissionInFlight | WorkbenchError::SelectionLocked => {
                AppError::Conflict(err.to_string())
            }
            WorkbenchError::Reason(reason) => reason.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Backend(e) => {
                tracing::error!("Backend error: {e}");
                match e {
                    // backend refused the request itself
                    ClientError::Api { status, message } if (400..500).contains(status) => (
                        StatusCode::BAD_GATEWAY,
                        "BACKEND_REJECTED",
                        message.clone(),
                    ),
                    _ => (
                        StatusCode::BAD_GATEWAY,
                        "BACKEND_ERROR",
                        "The screening backend is unavailable".to_string(),
                    ),
                }
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
