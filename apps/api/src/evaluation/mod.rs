//! Summary evaluation: pluggable scorer comparing a generated summary with a reference.
//!
//! Default: `RougeScorer` (ROUGE-1/2/L with stemming, pure Rust, deterministic).
//! `AppState` holds an `Option<Arc<dyn SummaryScorer>>`, installed at startup.

pub mod handlers;
pub mod rouge;

use async_trait::async_trait;
use rust_stemmers::{Algorithm, Stemmer};

use crate::errors::AppError;
pub use rouge::RougeScores;

/// The scorer trait. Implement this to swap metrics backends without touching
/// the endpoint or handler code.
#[async_trait]
pub trait SummaryScorer: Send + Sync {
    async fn score(&self, reference: &str, generated: &str) -> Result<RougeScores, AppError>;
}

/// Lexical-overlap scorer over Snowball-stemmed English tokens.
pub struct RougeScorer {
    stemmer: Stemmer,
}

impl RougeScorer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl Default for RougeScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SummaryScorer for RougeScorer {
    async fn score(&self, reference: &str, generated: &str) -> Result<RougeScores, AppError> {
        Ok(rouge::score(&self.stemmer, reference, generated))
    }
}
