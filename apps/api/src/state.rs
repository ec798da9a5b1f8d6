use std::sync::Arc;

use crate::errors::AppError;
use crate::evaluation::SummaryScorer;
use crate::summarization::Summarizer;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// `None` means the component failed to load at startup. The service then
/// stays up and answers the affected endpoints with 500 until restarted.
#[derive(Clone, Default)]
pub struct AppState {
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub scorer: Option<Arc<dyn SummaryScorer>>,
}

impl AppState {
    pub fn new(
        summarizer: Option<Arc<dyn Summarizer>>,
        scorer: Option<Arc<dyn SummaryScorer>>,
    ) -> Self {
        Self { summarizer, scorer }
    }

    pub fn summarizer(&self) -> Result<Arc<dyn Summarizer>, AppError> {
        self.summarizer
            .clone()
            .ok_or_else(|| AppError::NotReady("Model or tokenizer not loaded".to_string()))
    }

    pub fn scorer(&self) -> Result<Arc<dyn SummaryScorer>, AppError> {
        self.scorer
            .clone()
            .ok_or_else(|| AppError::NotReady("ROUGE scorer not initialized".to_string()))
    }

    pub fn is_ready(&self) -> bool {
        self.summarizer.is_some()
    }
}
