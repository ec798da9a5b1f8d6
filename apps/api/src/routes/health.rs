use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
/// Static welcome payload; answers even when the model failed to load.
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Welcome to Project Summarizer API" }))
}

/// GET /health
/// Returns service version and which components are loaded.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "summarizer-api",
        "model_ready": state.is_ready(),
        "scorer_ready": state.scorer.is_some()
    }))
}
