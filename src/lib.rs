//! Text Scanner Server Library
//!
//! An HTTP service that extracts text from uploaded images. Recognition is
//! delegated to an off-the-shelf OCR engine created once at startup.
//!
//! # Modules
//!
//! - `config`: Environment-driven configuration
//! - `ocr`: Preprocessing, engines and the recognition service
//! - `routes`: HTTP handlers

pub mod config;
pub mod error;
pub mod ocr;
pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config().limits.max_upload_bytes;

    Router::new()
        .nest("/health", routes::health::router())
        .merge(routes::recognize::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
