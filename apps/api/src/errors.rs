use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::blob::BlobError;
use crate::catalog::CatalogError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No file uploaded")]
    MissingAttachment,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// The request body could not be extracted at all (wrong content type, bad JSON, ...).
    #[error("Rejected request body: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::MissingAttachment => (
                StatusCode::BAD_REQUEST,
                "MISSING_ATTACHMENT",
                "No file uploaded".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Multipart(e) => {
                tracing::warn!("Rejected multipart body: {e}");
                (e.status(), "INVALID_MULTIPART", e.body_text())
            }
            AppError::Rejected { status, message } => {
                tracing::warn!("Rejected request body: {message}");
                (*status, "INVALID_BODY", message.clone())
            }
            AppError::Catalog(e) => {
                tracing::error!("Catalog error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_FAILURE",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Blob(e) => {
                tracing::error!("Blob store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_FAILURE",
                    "A storage error occurred".to_string(),
                )
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

        // `message` mirrors `error` for clients written against the older API.
        let body = Json(json!({
            "error": message,
            "message": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
