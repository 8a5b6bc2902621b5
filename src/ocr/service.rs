//! OCR Service
//!
//! Orchestrates decoding, preprocessing and the shared OCR engine.

use std::sync::Arc;

use super::{
    engine::OcrEngine,
    preprocess::Preprocessor,
    types::{EngineKind, OcrError},
};

/// Text recognition over a single process-wide engine
#[derive(Clone)]
pub struct OcrService {
    engine: Arc<dyn OcrEngine>,
    preprocessor: Preprocessor,
}

impl OcrService {
    pub fn new(engine: Arc<dyn OcrEngine>, preprocessor: Preprocessor) -> Self {
        Self {
            engine,
            preprocessor,
        }
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.engine.kind()
    }

    pub async fn is_available(&self) -> bool {
        self.engine.is_available().await
    }

    /// Reject uploads whose declared content type is not an image
    pub fn check_content_type(content_type: Option<&str>) -> Result<(), OcrError> {
        match content_type {
            Some(ct) if ct.trim_start().to_ascii_lowercase().starts_with("image/") => Ok(()),
            Some(ct) => Err(OcrError::UnsupportedContentType(ct.to_string())),
            None => Err(OcrError::UnsupportedContentType("none".to_string())),
        }
    }

    /// Recognize text in raw image bytes, returning fragments joined by single spaces
    pub async fn recognize(&self, bytes: Vec<u8>) -> Result<String, OcrError> {
        let preprocessor = self.preprocessor;

        // Decoding and Lanczos resampling are CPU bound
        let image = tokio::task::spawn_blocking(move || preprocessor.decode_and_prepare(&bytes))
            .await
            .map_err(|e| OcrError::Processing(format!("Preprocessing task failed: {}", e)))??;

        let fragments = self.engine.read_text(&image).await?;

        tracing::debug!(
            "Recognized {} fragments in {}x{} image",
            fragments.len(),
            image.width(),
            image.height()
        );

        Ok(join_fragments(&fragments))
    }
}

/// Join recognized fragments with single spaces, dropping blank ones
pub fn join_fragments(fragments: &[String]) -> String {
    fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
