//! Text recognition routes
//!
//! Endpoints:
//! - POST /recognize-text/ with a raw image body - returns the recognized text
//! - POST /recognize-text/ with `multipart/form-data` - one result per `files` part

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request, State},
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::ocr::{BatchResponse, FileResult, OcrService};
use crate::state::AppState;

/// Multipart field carrying the uploaded images
const FILES_FIELD: &str = "files";

/// Create the recognition router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recognize-text/", post(recognize_text))
        .route("/recognize-text", post(recognize_text))
}

/// POST /recognize-text/
///
/// Dispatches on the request content type: multipart uploads go through the
/// batch path, anything else is treated as a single raw image.
async fn recognize_text(State(state): State<AppState>, request: Request) -> Result<Response> {
    if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::Upload {
                status: e.status(),
                message: e.body_text(),
            })?;
        let batch = recognize_batch(state.ocr(), multipart).await?;
        return Ok(Json(batch).into_response());
    }

    let body = Bytes::from_request(request, &state)
        .await
        .map_err(|e| AppError::Upload {
            status: e.status(),
            message: e.body_text(),
        })?;

    let text = recognize_single(state.ocr(), body).await?;
    Ok(Json(text).into_response())
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Recognize a single raw image body
async fn recognize_single(ocr: &OcrService, body: Bytes) -> Result<String> {
    match ocr.recognize(body.to_vec()).await {
        Ok(text) => {
            tracing::info!(chars = text.chars().count(), "Recognized text in request body");
            Ok(text)
        }
        Err(e) => {
            tracing::error!("Error processing <body>: {}", e);
            Err(AppError::Ocr(e))
        }
    }
}

/// Recognize every `files` part in order, isolating failures per file
async fn recognize_batch(ocr: &OcrService, mut multipart: Multipart) -> Result<BatchResponse> {
    let mut results = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(FILES_FIELD) {
            tracing::debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().unwrap_or("unknown").to_string();
        let content_type = field.content_type().map(|s| s.to_string());

        // A stream failure (oversized or malformed body) ends the whole request
        let outcome = match OcrService::check_content_type(content_type.as_deref()) {
            Ok(()) => {
                let bytes = field.bytes().await.map_err(upload_error)?;
                ocr.recognize(bytes.to_vec()).await
            }
            Err(e) => Err(e),
        };

        let result = match outcome {
            Ok(text) => {
                tracing::info!(filename = %filename, "Recognized text");
                FileResult::success(filename, text)
            }
            Err(e) => {
                tracing::error!("Error processing {}: {}", filename, e);
                FileResult::failure(filename, &e)
            }
        };
        results.push(result);
    }

    if results.is_empty() {
        return Err(AppError::BadRequest(format!(
            "No files provided. Use field name '{}'",
            FILES_FIELD
        )));
    }

    Ok(BatchResponse { results })
}

fn upload_error(e: MultipartError) -> AppError {
    tracing::error!("Failed to read multipart upload: {}", e);
    AppError::Upload {
        status: e.status(),
        message: e.body_text(),
    }
}
