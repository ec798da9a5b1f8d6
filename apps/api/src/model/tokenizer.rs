use std::path::Path;

use tokenizers::Tokenizer;
use tracing::info;

use crate::model::LoadError;
use crate::summarization::GenerationError;

/// Maximum number of input tokens fed to the encoder.
pub const MAX_INPUT_TOKENS: usize = 1024;

/// Encoded model input. `truncated` is set when the text exceeded the budget.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedInput {
    pub ids: Vec<u32>,
    pub truncated: bool,
}

pub struct TokenizerWrapper {
    tokenizer: Tokenizer,
}

impl TokenizerWrapper {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        info!("Loading tokenizer from {:?}", path);
        let tokenizer =
            Tokenizer::from_file(path).map_err(|e| LoadError::Tokenizer(e.to_string()))?;

        info!(
            "Tokenizer loaded with {} tokens",
            tokenizer.get_vocab_size(true)
        );
        Ok(Self::new(tokenizer))
    }

    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Encodes `text` with special tokens and cuts it to `max_tokens`,
    /// keeping `eos_token` as the final id.
    pub fn encode_truncated(
        &self,
        text: &str,
        max_tokens: usize,
        eos_token: u32,
    ) -> Result<EncodedInput, GenerationError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))?;

        Ok(truncate_ids(encoding.get_ids().to_vec(), max_tokens, eos_token))
    }

    /// Decodes generated ids, dropping pad/eos and other special tokens.
    pub fn decode(&self, ids: &[u32]) -> Result<String, GenerationError> {
        self.tokenizer
            .decode(ids, true)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }
}

fn truncate_ids(mut ids: Vec<u32>, max_tokens: usize, eos_token: u32) -> EncodedInput {
    if ids.len() <= max_tokens || max_tokens == 0 {
        return EncodedInput {
            ids,
            truncated: false,
        };
    }

    ids.truncate(max_tokens - 1);
    ids.push(eos_token);
    EncodedInput {
        ids,
        truncated: true,
    }
}

/// Whitespace WordLevel tokenizer with T5-style special tokens
/// (`<pad>`=0, `</s>`=1 appended to every encoding, `<unk>`=2).
#[cfg(test)]
pub(crate) fn word_level_tokenizer() -> TokenizerWrapper {
    let special = |id: u32, content: &str| {
        serde_json::json!({
            "id": id, "content": content, "single_word": false, "lstrip": false,
            "rstrip": false, "normalized": false, "special": true
        })
    };
    let json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [special(0, "<pad>"), special(1, "</s>"), special(2, "<unk>")],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": {
            "type": "TemplateProcessing",
            "single": [
                { "Sequence": { "id": "A", "type_id": 0 } },
                { "SpecialToken": { "id": "</s>", "type_id": 0 } }
            ],
            "pair": [
                { "Sequence": { "id": "A", "type_id": 0 } },
                { "Sequence": { "id": "B", "type_id": 0 } },
                { "SpecialToken": { "id": "</s>", "type_id": 0 } }
            ],
            "special_tokens": {
                "</s>": { "id": "</s>", "ids": [1], "tokens": ["</s>"] }
            }
        },
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {
                "<pad>": 0, "</s>": 1, "<unk>": 2, "summarize": 3, ":": 4,
                "students": 5, "share": 6, "project": 7, "updates": 8,
                "weekly": 9, "with": 10, "mentors": 11
            },
            "unk_token": "<unk>"
        }
    });
    let tokenizer: Tokenizer = json.to_string().parse().unwrap();
    TokenizerWrapper::new(tokenizer)
}
