//! OCR Types
//!
//! Defines the result records and errors for text recognition of uploaded images.

use serde::{Deserialize, Serialize};

/// OCR engine backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineKind {
    /// Tesseract OCR (local)
    #[default]
    Tesseract,
    /// Ollama vision model (local LLM)
    Ollama,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::Ollama => "ollama",
        }
    }
}

/// Unrecognized engine name
#[derive(Debug, thiserror::Error)]
#[error("Unknown OCR engine: {0}")]
pub struct ParseEngineKindError(pub String);

impl std::str::FromStr for EngineKind {
    type Err = ParseEngineKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "ollama" => Ok(Self::Ollama),
            other => Err(ParseEngineKindError(other.to_string())),
        }
    }
}

/// Outcome of a single uploaded file in a batch request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Error,
}

/// Per-file recognition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub filename: String,
    /// Recognized text, empty when processing failed
    pub text: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FileResult {
    pub fn success(filename: impl Into<String>, text: String) -> Self {
        Self {
            filename: filename.into(),
            text,
            status: FileStatus::Success,
            message: None,
        }
    }

    pub fn failure(filename: impl Into<String>, error: &OcrError) -> Self {
        Self {
            filename: filename.into(),
            text: String::new(),
            status: FileStatus::Error,
            message: Some(error.to_string()),
        }
    }
}

/// Response body of the batch endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<FileResult>,
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Uploaded file is empty")]
    EmptyImage,

    #[error("File is not an image (content type: {0})")]
    UnsupportedContentType(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("OCR engine not available: {0}")]
    EngineUnavailable(String),

    #[error("OCR processing failed: {0}")]
    Processing(String),

    #[error("API error: {0}")]
    Api(String),
}

impl OcrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::EmptyImage | Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Processing(_) | Self::Api(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
