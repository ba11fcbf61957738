//! Application configuration: artifact locations, embedding model, LLM providers.
//!
//! Every field has a default, so an empty TOML file (or none at all) yields a
//! usable configuration rooted at the working directory. Relative paths in a
//! config file are resolved against the file's own directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("unknown LLM provider '{0}' (expected 'groq' or 'openrouter')")]
    UnknownProvider(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub artifacts: ArtifactPaths,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Defaults with all model paths rooted at `base`.
    pub fn with_base_dir(base: &Path) -> Self {
        let mut config = Self::default();
        config.resolve_paths(base);
        config
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: AppConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.llm.fill_defaults();
        info!(config = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in self.artifacts.paths_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if self.embedding.model_dir.is_relative() {
            self.embedding.model_dir = base.join(&self.embedding.model_dir);
        }
    }
}

/// Locations of the five pre-trained artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    pub env_encoder: PathBuf,
    pub uns_encoder: PathBuf,
    pub temp_scaler: PathBuf,
    pub pca: PathBuf,
    pub model: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            env_encoder: PathBuf::from("models/encoders/env_target_encoder.json"),
            uns_encoder: PathBuf::from("models/encoders/uns_encoder.json"),
            temp_scaler: PathBuf::from("models/scalers/temprature_scaler.json"),
            pca: PathBuf::from("models/decomposers/pca.json"),
            model: PathBuf::from("models/classifiers/rf_all_data.onnx"),
        }
    }
}

impl ArtifactPaths {
    /// `(role, path)` pairs in load order.
    pub fn entries(&self) -> [(&'static str, &Path); 5] {
        [
            ("env_encoder", self.env_encoder.as_path()),
            ("uns_encoder", self.uns_encoder.as_path()),
            ("temp_scaler", self.temp_scaler.as_path()),
            ("pca", self.pca.as_path()),
            ("model", self.model.as_path()),
        ]
    }

    fn paths_mut(&mut self) -> [&mut PathBuf; 5] {
        [
            &mut self.env_encoder,
            &mut self.uns_encoder,
            &mut self.temp_scaler,
            &mut self.pca,
            &mut self.model,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Directory containing `model.onnx` and `tokenizer.json`.
    pub model_dir: PathBuf,
    /// Token truncation length.
    pub max_length: usize,
    /// Maximum cached embeddings; `0` means unbounded.
    pub cache_capacity: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/scibert_scivocab_uncased"),
            max_length: 128,
            cache_capacity: 4096,
        }
    }
}

/// The two interchangeable text-generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    OpenRouter,
}

impl ProviderKind {
    /// The fallback for this provider.
    pub fn complement(self) -> Self {
        match self {
            Self::Groq => Self::OpenRouter,
            Self::OpenRouter => Self::Groq,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenRouter => "openrouter",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    pub fn default_models(self) -> Vec<String> {
        let models: &[&str] = match self {
            Self::Groq => &[
                "llama-3.3-70b-versatile",
                "llama3-70b-8192",
                "deepseek-r1-distill-llama-70b",
                "meta-llama/llama-4-maverick-17b-128e-instruct",
                "qwen-qwq-32b",
            ],
            Self::OpenRouter => &[
                "deepseek/deepseek-r1",
                "google/gemini-2.5-flash-preview",
                "meta-llama/llama-4-maverick",
            ],
        };
        models.iter().map(|m| m.to_string()).collect()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Credentials and model rotation list for one provider.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_keys: Vec<String>,
    pub models: Vec<String>,
}

impl ProviderSettings {
    pub fn for_provider(kind: ProviderKind) -> Self {
        Self {
            base_url: kind.default_base_url().to_string(),
            api_keys: Vec::new(),
            models: kind.default_models(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_keys.is_empty() && !self.models.is_empty()
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("base_url", &self.base_url)
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .field("models", &self.models)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub default_provider: ProviderKind,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt deadline; a timed-out attempt triggers fallback.
    pub request_timeout_secs: u64,
    pub groq: ProviderSettings,
    pub openrouter: ProviderSettings,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::OpenRouter,
            temperature: 0.3,
            max_tokens: 1024,
            request_timeout_secs: 60,
            groq: ProviderSettings::for_provider(ProviderKind::Groq),
            openrouter: ProviderSettings::for_provider(ProviderKind::OpenRouter),
        }
    }
}

impl LlmConfig {
    pub fn provider(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Groq => &self.groq,
            ProviderKind::OpenRouter => &self.openrouter,
        }
    }

    pub fn provider_mut(&mut self, kind: ProviderKind) -> &mut ProviderSettings {
        match kind {
            ProviderKind::Groq => &mut self.groq,
            ProviderKind::OpenRouter => &mut self.openrouter,
        }
    }

    /// Restore per-provider defaults for fields a config file left empty.
    pub fn fill_defaults(&mut self) {
        for kind in [ProviderKind::Groq, ProviderKind::OpenRouter] {
            let settings = self.provider_mut(kind);
            if settings.base_url.is_empty() {
                settings.base_url = kind.default_base_url().to_string();
            }
            if settings.models.is_empty() {
                settings.models = kind.default_models();
            }
        }
    }
}
