//! Axum route handlers for the Summarization API.

use std::time::Instant;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::summarization::project::{format_project, ProjectDetails};
use crate::summarization::{
    GenerationParams, DEFAULT_MAX_LENGTH, DEFAULT_NUM_BEAMS, MAX_NUM_BEAMS, MAX_OUTPUT_LENGTH,
};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    pub max_length: Option<usize>,
    pub num_beams: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeProjectRequest {
    pub project: ProjectDetails,
    pub max_length: Option<usize>,
    pub num_beams: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub status: String,
    pub summary: String,
    /// Present (and true) only when the input was cut to the token budget.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub input_truncated: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/summarize/
///
/// Summarizes free text with beam search.
pub async fn handle_summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let params = resolve_params(request.max_length, request.num_beams)?;
    summarize_text(&state, &request.text, params).await.map(Json)
}

/// POST /api/summarize-project/
///
/// Flattens the project into the fixed template, then summarizes it like free text.
pub async fn handle_summarize_project(
    State(state): State<AppState>,
    Json(request): Json<SummarizeProjectRequest>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let params = resolve_params(request.max_length, request.num_beams)?;
    let text = format_project(&request.project);

    info!("Summarizing project \"{}\"", request.project.title);
    summarize_text(&state, &text, params).await.map(Json)
}

// ────────────────────────────────────────────────────────────────────────────
// Shared path
// ────────────────────────────────────────────────────────────────────────────

async fn summarize_text(
    state: &AppState,
    text: &str,
    params: GenerationParams,
) -> Result<SummarizeResponse, AppError> {
    let summarizer = state.summarizer()?;

    let request_id = Uuid::new_v4();
    let started = Instant::now();
    info!(
        %request_id,
        chars = text.len(),
        max_length = params.max_length,
        num_beams = params.num_beams,
        "Summarization request"
    );

    let summary = summarizer.summarize(text, params).await?;

    if summary.input_truncated {
        warn!(%request_id, "Input exceeded the token budget and was truncated");
    }
    info!(
        %request_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        summary_chars = summary.text.len(),
        "Summarization complete"
    );

    Ok(SummarizeResponse {
        status: "success".to_string(),
        summary: summary.text,
        input_truncated: summary.input_truncated,
    })
}

/// Applies defaults for absent/null knobs and rejects values outside
/// `1..=MAX_OUTPUT_LENGTH` / `1..=MAX_NUM_BEAMS`.
fn resolve_params(
    max_length: Option<usize>,
    num_beams: Option<usize>,
) -> Result<GenerationParams, AppError> {
    let params = GenerationParams {
        max_length: max_length.unwrap_or(DEFAULT_MAX_LENGTH),
        num_beams: num_beams.unwrap_or(DEFAULT_NUM_BEAMS),
    };

    if !(1..=MAX_OUTPUT_LENGTH).contains(&params.max_length) {
        return Err(AppError::Validation(format!(
            "max_length must be between 1 and {MAX_OUTPUT_LENGTH}"
        )));
    }
    if !(1..=MAX_NUM_BEAMS).contains(&params.num_beams) {
        return Err(AppError::Validation(format!(
            "num_beams must be between 1 and {MAX_NUM_BEAMS}"
        )));
    }

    Ok(params)
}
