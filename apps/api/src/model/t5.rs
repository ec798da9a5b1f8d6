use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::t5;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::model::loader::ModelFiles;
use crate::model::tokenizer::{TokenizerWrapper, MAX_INPUT_TOKENS};
use crate::model::LoadError;
use crate::summarization::beam::{beam_search, BeamSearchConfig, DecoderStep};
use crate::summarization::{GenerationError, GenerationParams, Summarizer, Summary};

const LENGTH_PENALTY: f32 = 1.0;

#[derive(Debug, Clone, Copy)]
struct SpecialTokens {
    decoder_start: u32,
    eos: u32,
}

/// T5-family encoder/decoder behind the `Summarizer` trait.
///
/// Weights are placed on `device` once at load time. Each request works on a
/// clone of the model; the clone shares the weight tensors.
pub struct T5Summarizer {
    model: t5::T5ForConditionalGeneration,
    tokenizer: Arc<TokenizerWrapper>,
    device: Device,
    tokens: SpecialTokens,
    prefix: String,
}

impl T5Summarizer {
    pub fn load(
        files: &ModelFiles,
        tokenizer: TokenizerWrapper,
        device: Device,
        prefix: String,
    ) -> Result<Self, LoadError> {
        let raw = std::fs::read_to_string(&files.config)?;
        let mut config: t5::Config = serde_json::from_str(&raw)?;
        // Beams are reordered every step, so a per-sequence KV cache would go stale.
        config.use_cache = false;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&files.weights], DType::F32, &device)?
        };

        info!("Building T5 model...");
        let model = t5::T5ForConditionalGeneration::load(vb, &config)?;

        let tokens = SpecialTokens {
            decoder_start: config.decoder_start_token_id.unwrap_or(config.pad_token_id) as u32,
            eos: config.eos_token_id as u32,
        };
        info!(
            "Model ready: d_model={}, layers={}, vocab={} (tokenizer vocab={})",
            config.d_model,
            config.num_layers,
            config.vocab_size,
            tokenizer.vocab_size()
        );

        Ok(Self {
            model,
            tokenizer: Arc::new(tokenizer),
            device,
            tokens,
            prefix,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Text handed to the tokenizer: the task prefix followed by the request text.
    fn model_input(&self, text: &str) -> String {
        format!("{}{}", self.prefix, text)
    }
}

#[async_trait]
impl Summarizer for T5Summarizer {
    async fn summarize(&self, text: &str, params: GenerationParams) -> Result<Summary, AppError> {
        let model = self.model.clone();
        let tokenizer = Arc::clone(&self.tokenizer);
        let device = self.device.clone();
        let tokens = self.tokens;
        let input = self.model_input(text);

        tokio::task::spawn_blocking(move || {
            generate(model, &tokenizer, &device, tokens, &input, params)
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(AppError::from)
    }
}

fn generate(
    mut model: t5::T5ForConditionalGeneration,
    tokenizer: &TokenizerWrapper,
    device: &Device,
    tokens: SpecialTokens,
    input: &str,
    params: GenerationParams,
) -> Result<Summary, GenerationError> {
    let started = Instant::now();

    let encoded = tokenizer.encode_truncated(input, MAX_INPUT_TOKENS, tokens.eos)?;
    if encoded.ids.is_empty() {
        return Err(GenerationError::EmptyInput);
    }
    debug!(
        "Input tokens: {} (truncated: {})",
        encoded.ids.len(),
        encoded.truncated
    );

    let input_ids = Tensor::new(encoded.ids.as_slice(), device)?.unsqueeze(0)?;
    let encoder_output = model.encode(&input_ids)?;

    let mut decoder = T5Decoder::new(&mut model, &encoder_output, device);
    let output_ids = beam_search(
        &mut decoder,
        &BeamSearchConfig {
            num_beams: params.num_beams,
            max_length: params.max_length,
            start_token: tokens.decoder_start,
            end_token: tokens.eos,
            length_penalty: LENGTH_PENALTY,
        },
    )?;

    let text = tokenizer.decode(&output_ids)?;
    debug!(
        "Generated {} tokens in {}ms",
        output_ids.len(),
        started.elapsed().as_millis()
    );

    Ok(Summary {
        text: text.trim().to_string(),
        input_truncated: encoded.truncated,
    })
}

/// One decoder pass over all open beams against a shared encoder output.
struct T5Decoder<'a> {
    model: &'a mut t5::T5ForConditionalGeneration,
    /// `(1, input_len, d_model)`
    encoder_output: &'a Tensor,
    device: &'a Device,
    /// Encoder output repeated for the last beam count seen.
    expanded: Option<(usize, Tensor)>,
}

impl<'a> T5Decoder<'a> {
    fn new(
        model: &'a mut t5::T5ForConditionalGeneration,
        encoder_output: &'a Tensor,
        device: &'a Device,
    ) -> Self {
        Self {
            model,
            encoder_output,
            device,
            expanded: None,
        }
    }

    fn encoder_output_for(&mut self, num_beams: usize) -> candle_core::Result<Tensor> {
        if let Some((n, expanded)) = &self.expanded {
            if *n == num_beams {
                return Ok(expanded.clone());
            }
        }

        let (_, input_len, hidden) = self.encoder_output.dims3()?;
        let expanded = self
            .encoder_output
            .broadcast_as((num_beams, input_len, hidden))?
            .contiguous()?;
        self.expanded = Some((num_beams, expanded.clone()));
        Ok(expanded)
    }
}

impl DecoderStep for T5Decoder<'_> {
    fn next_log_probs(&mut self, beams: &[Vec<u32>]) -> Result<Vec<Vec<f32>>, GenerationError> {
        let num_beams = beams.len();
        let seq_len = beams.first().map(Vec::len).unwrap_or(0);
        let flat: Vec<u32> = beams.iter().flatten().copied().collect();
        let decoder_ids = Tensor::from_vec(flat, (num_beams, seq_len), self.device)?;
        let encoder_output = self.encoder_output_for(num_beams)?;

        let logits = self.model.decode(&decoder_ids, &encoder_output)?;
        let log_probs = candle_nn::ops::log_softmax(&logits, D::Minus1)?;
        Ok(log_probs.to_dtype(DType::F32)?.to_vec2::<f32>()?)
    }
}
