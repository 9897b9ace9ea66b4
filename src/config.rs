use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SecondMeConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub logs_dir: String,
    pub index_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
    pub pooling: Pooling,
}

/// How token embeddings are reduced to one sentence vector.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Pooling {
    /// Take the first (`[CLS]`) token.
    Cls,
    /// Attention-masked mean over all tokens.
    Mean,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub url: String,
    pub model: String,
    /// Chunk fields that may carry a text fragment, checked in order.
    pub fragment_fields: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            logs_dir: "logs".into(),
            index_dir: "index".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_second_me_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "sentence-transformers/LaBSE".into(),
            cache_dir,
            pooling: Pooling::Cls,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/generate".into(),
            model: "mistral".into(),
            fragment_fields: crate::generation::DEFAULT_FRAGMENT_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

impl EmbeddingConfig {
    /// Directory holding `model.onnx` and `tokenizer.json` for the configured model.
    pub fn model_dir(&self) -> PathBuf {
        expand_tilde(&self.cache_dir).join(self.model.replace('/', "--"))
    }
}

/// Returns `~/.second-me/`
pub fn default_second_me_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".second-me")
}

/// Returns the default config file path: `~/.second-me/config.toml`
pub fn default_config_path() -> PathBuf {
    default_second_me_dir().join("config.toml")
}

impl SecondMeConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SecondMeConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SECOND_ME_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("SECOND_ME_EMBED_MODEL") {
            self.embedding.model = val;
        }
        if let Ok(val) = std::env::var("SECOND_ME_LLM_URL") {
            self.generation.url = val;
        }
        if let Ok(val) = std::env::var("SECOND_ME_LLM_MODEL") {
            self.generation.model = val;
        }
        if let Ok(val) = std::env::var("SECOND_ME_LOGS_DIR") {
            self.storage.logs_dir = val;
        }
        if let Ok(val) = std::env::var("SECOND_ME_INDEX_DIR") {
            self.storage.index_dir = val;
        }
    }

    pub fn logs_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.logs_dir)
    }

    pub fn index_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.index_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
