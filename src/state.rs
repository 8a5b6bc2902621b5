//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::ocr::{build_engine, OcrEngine, OcrService, Preprocessor};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub config: Config,
    pub ocr: OcrService,
}

impl AppState {
    /// Create the application state, building the OCR engine from configuration.
    ///
    /// The engine is created once here and shared by every request.
    pub fn new(config: Config) -> Self {
        let engine = build_engine(&config.ocr);
        Self::with_engine(config, engine)
    }

    /// Create the application state around an existing engine
    pub fn with_engine(config: Config, engine: Arc<dyn OcrEngine>) -> Self {
        let preprocessor = Preprocessor::new(config.ocr.upscale_threshold, config.ocr.upscale_factor);

        Self {
            inner: Arc::new(AppStateInner {
                ocr: OcrService::new(engine, preprocessor),
                config,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the OCR service
    pub fn ocr(&self) -> &OcrService {
        &self.inner.ocr
    }
}
