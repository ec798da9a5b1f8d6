//! Summarization: the text-in, summary-out path shared by both summarize endpoints.
//!
//! The serving layer only sees the `Summarizer` trait; the candle-backed
//! implementation lives in `crate::model`.

pub mod beam;
pub mod handlers;
pub mod project;

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::AppError;

pub const DEFAULT_MAX_LENGTH: usize = 150;
pub const DEFAULT_NUM_BEAMS: usize = 4;
/// Upper bounds on per-request knobs. Beam count scales decoder memory linearly.
pub const MAX_NUM_BEAMS: usize = 16;
pub const MAX_OUTPUT_LENGTH: usize = 1024;

/// Decoding knobs accepted per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    /// Maximum decoder positions, counting the decoder start token.
    pub max_length: usize,
    pub num_beams: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            num_beams: DEFAULT_NUM_BEAMS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub text: String,
    /// The input was cut to the encoder's token budget before generation.
    pub input_truncated: bool,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("decoder returned {got} rows for {expected} beams")]
    BeamShape { expected: usize, got: usize },

    #[error("input text produced no tokens")]
    EmptyInput,
}

impl From<GenerationError> for AppError {
    fn from(e: GenerationError) -> Self {
        AppError::Generation(e.to_string())
    }
}

/// The summarizer trait. Implement this to swap generation backends without
/// touching the handlers.
///
/// Carried in `AppState` as `Option<Arc<dyn Summarizer>>`.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, params: GenerationParams) -> Result<Summary, AppError>;
}
