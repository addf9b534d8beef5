//! Configuration for the question-answering service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::retrieval::DistanceMetric;

/// Environment variable holding the generative-model API key (required)
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Environment variable holding the flash-cookie signing secret
pub const SECRET_KEY_ENV: &str = "SECRET_KEY";
/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "MEDRAG_CONFIG";

const INSECURE_DEFAULT_SECRET: &str = "supersecretkey";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding provider configuration
    pub embeddings: EmbeddingConfig,
    /// Generative model configuration
    pub llm: LlmConfig,
    /// On-disk state
    pub storage: StorageConfig,
    /// Retrieval parameters
    pub retrieval: RetrievalConfig,
    /// Session (flash cookie) configuration
    pub session: SessionConfig,
}

impl RagConfig {
    /// Load configuration: `.env`, optional TOML file, then environment overrides.
    ///
    /// Fails when the generative-model API key is missing.
    pub fn load() -> Result<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a TOML config file; absent sections take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{} environment variable is not set", API_KEY_ENV))
            })?;
        self.llm.api_key = api_key.clone();
        if self.embeddings.provider == EmbeddingBackend::Gemini {
            self.embeddings.api_key = Some(api_key);
        }

        match lookup(SECRET_KEY_ENV).filter(|s| !s.is_empty()) {
            Some(secret) => self.session.secret_key = secret,
            None if self.session.secret_key.is_empty() => {
                tracing::warn!(
                    "{} not set, signing flash cookies with an insecure default secret",
                    SECRET_KEY_ENV
                );
                self.session.secret_key = INSECURE_DEFAULT_SECRET.to_string();
            }
            None => {}
        }

        if let Some(host) = lookup("MEDRAG_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("MEDRAG_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid MEDRAG_PORT '{}': {}", port, e)))?;
        }

        self.validate()
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config(
                "embeddings.dimensions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Which embedding service produces vectors
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Gemini `embedContent` API
    Gemini,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider backend
    pub provider: EmbeddingBackend,
    /// Model name
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text and text-embedding-004)
    pub dimensions: usize,
    /// Base URL of the provider API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// API key, copied from the environment for the Gemini backend
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Ollama,
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 60,
            api_key: None,
        }
    }
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Generation model name
    pub model: String,
    /// Base URL of the Generative Language API
    pub base_url: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// API key, only ever read from the environment
    #[serde(skip)]
    pub api_key: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-exp".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.3,
            max_output_tokens: 2048,
            timeout_secs: 120,
            api_key: String::new(),
        }
    }
}

/// What happens to uploaded PDFs once they are indexed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadRetention {
    /// Keep files in the upload directory
    #[default]
    Retain,
    /// Remove files after the batch has been processed
    DeleteAfterIngest,
}

/// On-disk state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Index snapshot file
    pub snapshot_path: PathBuf,
    /// Directory uploaded PDFs are written to
    pub upload_dir: PathBuf,
    /// Retention policy for uploaded files
    pub retention: UploadRetention,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("vector_store.json"),
            upload_dir: PathBuf::from("uploads"),
            retention: UploadRetention::Retain,
        }
    }
}

/// Retrieval parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of pages placed in the prompt context
    pub top_k: usize,
    /// Distance metric for new indexes
    pub metric: DistanceMetric,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            metric: DistanceMetric::Euclidean,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Secret used to sign flash cookies, only read from the environment
    #[serde(skip)]
    pub secret_key: String,
}
