//! Model store: resolves, loads and places the summarization model once at startup.

pub mod device;
pub mod loader;
pub mod t5;
pub mod tokenizer;

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::model::t5::T5Summarizer;
use crate::model::tokenizer::TokenizerWrapper;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Hub error: {0}")]
    Hub(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
}

/// Loads the tokenizer and model and places the model on its device.
///
/// Blocking: downloads and memory-maps weights. Run it off the async runtime.
pub fn load(config: &Config) -> Result<T5Summarizer, LoadError> {
    let device = device::select_device(config.force_cpu);
    info!("Using device: {}", device::device_label(&device));

    let files = loader::resolve_model_files(config)?;
    info!(
        "Model files resolved: config={:?}, weights={:?}, tokenizer={:?}",
        files.config, files.weights, files.tokenizer
    );

    let tokenizer = TokenizerWrapper::load(&files.tokenizer)?;
    T5Summarizer::load(&files, tokenizer, device, config.summary_prefix.clone())
}
