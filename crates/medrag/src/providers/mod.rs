//! Provider abstractions for embeddings and answer generation
//!
//! The service only talks to these traits, so the hosted backends can be
//! swapped (or faked in tests) without touching the pipeline.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;

pub use embedding::{EmbedderFingerprint, EmbeddingProvider};
pub use gemini::{GeminiClient, GeminiEmbedder};
pub use llm::LlmProvider;
pub use ollama::OllamaEmbedder;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::Result;

/// Construct the configured embedding provider
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(match config.provider {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(config)?),
        EmbeddingBackend::Gemini => Arc::new(GeminiEmbedder::new(config)?),
    })
}
