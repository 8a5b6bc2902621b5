//! OCR Module
//!
//! Provides text recognition for uploaded images. The recognition itself is
//! delegated to an off-the-shelf engine; this module decodes uploads,
//! normalizes them and joins the recognized fragments.
//!
//! Supports multiple backends:
//! - Tesseract (local, requires installation)
//! - Ollama vision models (local LLM)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use text_scanner_server::ocr::{build_engine, OcrService, Preprocessor};
//!
//! let engine = build_engine(&config.ocr);
//! let service = OcrService::new(engine, Preprocessor::default());
//!
//! let text = service.recognize(image_bytes).await?;
//! ```

mod engine;
mod preprocess;
mod service;
mod types;

pub use engine::{build_engine, OcrEngine, OllamaEngine, TesseractEngine};
pub use preprocess::{decode, Preprocessor};
pub use service::{join_fragments, OcrService};
pub use types::{BatchResponse, EngineKind, FileResult, FileStatus, OcrError, ParseEngineKindError};
