//! Health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub engine: &'static str,
    pub engine_available: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine_available = state.ocr().is_available().await;

    Json(HealthResponse {
        status: if engine_available { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        service: "text-scanner-server",
        engine: state.ocr().engine_kind().as_str(),
        engine_available,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}
