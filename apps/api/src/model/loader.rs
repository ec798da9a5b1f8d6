use std::path::{Path, PathBuf};

use hf_hub::api::sync::{Api, ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use tracing::info;

use crate::config::Config;
use crate::model::LoadError;

const CONFIG_FILE: &str = "config.json";
const WEIGHTS_FILE: &str = "model.safetensors";
const TOKENIZER_FILE: &str = "tokenizer.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub weights: PathBuf,
    pub tokenizer: PathBuf,
}

/// Resolves the model artifact and tokenizer.
///
/// The local model directory wins when it holds both the config and the
/// weights. The tokenizer is taken from the same directory when present,
/// otherwise the named pretrained tokenizer is fetched from the Hub.
pub fn resolve_model_files(config: &Config) -> Result<ModelFiles, LoadError> {
    let mut hub: Option<Api> = None;

    let (config_path, weights) = match local_model_files(&config.model_dir) {
        Some(found) => {
            info!("Using local model directory {:?}", config.model_dir);
            found
        }
        None => {
            info!(
                "Local model directory {:?} incomplete, fetching {} (revision: {})",
                config.model_dir, config.model_id, config.model_revision
            );
            let api = build_api(config.hf_token.as_deref())?;
            let repo = hub_repo(&api, &config.model_id, &config.model_revision);
            let files = (fetch(&repo, CONFIG_FILE)?, fetch(&repo, WEIGHTS_FILE)?);
            hub = Some(api);
            files
        }
    };

    let tokenizer = match local_tokenizer(&config.model_dir) {
        Some(path) => path,
        None => {
            info!("Fetching pretrained tokenizer {}", config.tokenizer_id);
            let api = match hub {
                Some(api) => api,
                None => build_api(config.hf_token.as_deref())?,
            };
            let repo = hub_repo(&api, &config.tokenizer_id, &config.model_revision);
            fetch(&repo, TOKENIZER_FILE)?
        }
    };

    Ok(ModelFiles {
        config: config_path,
        weights,
        tokenizer,
    })
}

/// Returns `(config.json, model.safetensors)` when both exist under `dir`.
pub fn local_model_files(dir: &Path) -> Option<(PathBuf, PathBuf)> {
    let config = dir.join(CONFIG_FILE);
    let weights = dir.join(WEIGHTS_FILE);
    (config.is_file() && weights.is_file()).then_some((config, weights))
}

pub fn local_tokenizer(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(TOKENIZER_FILE);
    path.is_file().then_some(path)
}

fn build_api(token: Option<&str>) -> Result<Api, LoadError> {
    match token {
        Some(t) => ApiBuilder::new()
            .with_token(Some(t.to_string()))
            .build()
            .map_err(|e| LoadError::Hub(e.to_string())),
        None => Api::new().map_err(|e| LoadError::Hub(e.to_string())),
    }
}

fn hub_repo(api: &Api, repo_id: &str, revision: &str) -> ApiRepo {
    api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ))
}

fn fetch(repo: &ApiRepo, file: &str) -> Result<PathBuf, LoadError> {
    repo.get(file)
        .map_err(|e| LoadError::Hub(format!("Failed to download {file}: {e}")))
}
