//! Axum route handler for the Evaluation API.

use axum::{
    extract::{Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::evaluation::RougeScores;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EvaluateParams {
    pub reference: Option<String>,
    pub generated: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub status: String,
    pub scores: RougeScores,
}

/// POST /api/evaluate-summary/
///
/// Scores `generated` against `reference`. Both are read from the query
/// string; a JSON body fills in whichever is missing.
pub async fn handle_evaluate_summary(
    State(state): State<AppState>,
    Query(query): Query<EvaluateParams>,
    body: Bytes,
) -> Result<Json<EvaluateResponse>, AppError> {
    let (reference, generated) = merge_params(query, &body)?;

    let scorer = state.scorer()?;
    let scores = scorer.score(&reference, &generated).await?;

    Ok(Json(EvaluateResponse {
        status: "success".to_string(),
        scores,
    }))
}

fn merge_params(query: EvaluateParams, body: &[u8]) -> Result<(String, String), AppError> {
    let from_body = if body.iter().all(u8::is_ascii_whitespace) {
        EvaluateParams::default()
    } else {
        serde_json::from_slice::<EvaluateParams>(body)
            .map_err(|e| AppError::Validation(format!("invalid JSON body: {e}")))?
    };

    let reference = query.reference.or(from_body.reference);
    let generated = query.generated.or(from_body.generated);

    match (reference, generated) {
        (Some(reference), Some(generated)) => Ok((reference, generated)),
        (None, _) => Err(AppError::Validation("reference is required".to_string())),
        (_, None) => Err(AppError::Validation("generated is required".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(reference: Option<&str>, generated: Option<&str>) -> EvaluateParams {
        EvaluateParams {
            reference: reference.map(str::to_string),
            generated: generated.map(str::to_string),
        }
    }

    #[test]
    fn test_query_params_only() {
        let (r, g) = merge_params(query(Some("ref"), Some("gen")), b"").unwrap();
        assert_eq!((r.as_str(), g.as_str()), ("ref", "gen"));
    }

    #[test]
    fn test_body_fills_missing_params() {
        let (r, g) = merge_params(query(Some("ref"), None), br#"{"generated": "gen"}"#).unwrap();
        assert_eq!((r.as_str(), g.as_str()), ("ref", "gen"));
    }

    #[test]
    fn test_query_wins_over_body() {
        let body = br#"{"reference": "body-ref", "generated": "body-gen"}"#;
        let (r, g) = merge_params(query(Some("q-ref"), None), body).unwrap();
        assert_eq!((r.as_str(), g.as_str()), ("q-ref", "body-gen"));
    }

    #[test]
    fn test_empty_strings_are_accepted() {
        let (r, g) = merge_params(query(Some(""), Some("")), b"").unwrap();
        assert!(r.is_empty() && g.is_empty());
    }

    #[test]
    fn test_missing_params_are_rejected() {
        assert!(matches!(
            merge_params(query(None, Some("gen")), b""),
            Err(AppError::Validation(msg)) if msg.contains("reference")
        ));
        assert!(matches!(
            merge_params(query(Some("ref"), None), b"  "),
            Err(AppError::Validation(msg)) if msg.contains("generated")
        ));
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        assert!(matches!(
            merge_params(query(None, None), b"{not json"),
            Err(AppError::Validation(_))
        ));
    }
}
