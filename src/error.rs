//! Error types for the Text Scanner server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ocr::OcrError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Ocr(#[from] OcrError),

    /// Request body could not be read; carries the status axum assigned
    #[error("Upload rejected: {message}")]
    Upload { status: StatusCode, message: String },
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Ocr(e) => {
                let status = e.status_code();
                let error_type = match e {
                    OcrError::EmptyImage => "empty_image",
                    OcrError::UnsupportedContentType(_) => "unsupported_media_type",
                    OcrError::Decode(_) => "decode_error",
                    OcrError::EngineUnavailable(_) => "engine_unavailable",
                    OcrError::Processing(_) | OcrError::Api(_) => "ocr_error",
                };
                (status, error_type, e.to_string())
            }
            AppError::Upload { status, message } => {
                let error_type = if *status == StatusCode::PAYLOAD_TOO_LARGE {
                    "payload_too_large"
                } else {
                    "bad_request"
                };
                (*status, error_type, message.clone())
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
