use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_MODEL_ID: &str = "t5-small";
const DEFAULT_SUMMARY_PREFIX: &str = "summarize: ";

/// Application configuration loaded from environment variables.
/// Every field has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    /// Local model directory. Used when it holds both `config.json` and
    /// `model.safetensors`; otherwise the Hub is consulted.
    pub model_dir: PathBuf,
    pub model_id: String,
    pub model_revision: String,
    pub tokenizer_id: String,
    pub hf_token: Option<String>,
    pub force_cpu: bool,
    pub summary_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let model_id = optional_env("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

        Ok(Config {
            host: optional_env("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            model_dir: match optional_env("MODEL_DIR") {
                Some(dir) => PathBuf::from(dir),
                None => default_model_dir()?,
            },
            tokenizer_id: optional_env("TOKENIZER_ID").unwrap_or_else(|| model_id.clone()),
            model_id,
            model_revision: optional_env("MODEL_REVISION").unwrap_or_else(|| "main".to_string()),
            hf_token: optional_env("HF_TOKEN"),
            force_cpu: parse_bool("FORCE_CPU", std::env::var("FORCE_CPU").ok().as_deref())?,
            summary_prefix: std::env::var("SUMMARY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_SUMMARY_PREFIX.to_string()),
        })
    }
}

/// `model/` next to the installed executable.
fn default_model_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot resolve the executable location")?;
    let base = exe
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("model"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, value: Option<&str>) -> Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "" | "0" | "false" | "no" | "off" => Ok(false),
            "1" | "true" | "yes" | "on" => Ok(true),
            other => anyhow::bail!("{key} must be a boolean, got '{other}'"),
        },
    }
}
