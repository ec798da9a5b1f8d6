pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers as evaluation;
use crate::state::AppState;
use crate::summarization::handlers as summarization;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Summarization API
        .route("/api/summarize/", post(summarization::handle_summarize))
        .route("/api/summarize", post(summarization::handle_summarize))
        .route(
            "/api/summarize-project/",
            post(summarization::handle_summarize_project),
        )
        .route(
            "/api/summarize-project",
            post(summarization::handle_summarize_project),
        )
        // Evaluation API
        .route(
            "/api/evaluate-summary/",
            post(evaluation::handle_evaluate_summary),
        )
        .route(
            "/api/evaluate-summary",
            post(evaluation::handle_evaluate_summary),
        )
        .with_state(state)
}
