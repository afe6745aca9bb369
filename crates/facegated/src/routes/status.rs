use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub strategy: String,
    pub ready: bool,
    pub analyzer_loaded: bool,
}

/// Daemon status: active strategy, readiness and whether the models loaded.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let engine = &state.engine;
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        strategy: engine.strategy().to_string(),
        ready: engine.is_ready(),
        analyzer_loaded: engine.analyzer_loaded(),
    })
}
