use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::models::{Level, LockState};
use crate::progression::ProgressionError;
use crate::store::StoreError;

/// Errors surfaced by HTTP handlers, rendered as `{"error", "code"}` JSON.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Progression(#[from] ProgressionError),

    #[error("{level} day {day} is {state}")]
    Locked { level: Level, day: u32, state: LockState },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match &self {
            AppError::Progression(ProgressionError::InvalidTransition { state, .. }) => (
                StatusCode::CONFLICT,
                json!({ "error": message, "code": "INVALID_TRANSITION", "state": state }),
            ),
            AppError::Locked { state, .. } => (
                StatusCode::FORBIDDEN,
                json!({ "error": message, "code": "LOCKED", "state": state }),
            ),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({ "error": message, "code": "NOT_FOUND" }),
            ),
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "code": "VALIDATION_ERROR" }),
            ),
            AppError::Store(e) => {
                tracing::error!(error=%e, "store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An internal error occurred", "code": "INTERNAL_ERROR" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
