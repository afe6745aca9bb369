//! The two static HTML pages, read from the templates directory per request.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::path::Path;
use std::sync::Arc;

pub const INDEX_TEMPLATE: &str = "index.html";
pub const TAUNTING_TEMPLATE: &str = "taunting.html";

pub async fn home(State(state): State<Arc<AppState>>) -> Response {
    render(&state.templates_dir, INDEX_TEMPLATE).await
}

pub async fn taunting(State(state): State<Arc<AppState>>) -> Response {
    render(&state.templates_dir, TAUNTING_TEMPLATE).await
}

async fn render(dir: &Path, name: &str) -> Response {
    let path = dir.join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => {
            tracing::debug!(template = name, "serving page");
            Html(html).into_response()
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "template missing");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("template {name} is missing"),
            )
                .into_response()
        }
    }
}
