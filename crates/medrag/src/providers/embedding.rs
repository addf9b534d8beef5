//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Identity of an embedding configuration.
///
/// Vectors are only comparable when they share a fingerprint, so it is stored
/// with every persisted index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderFingerprint {
    /// Provider name (e.g. "ollama")
    pub provider: String,
    /// Model name
    pub model: String,
    /// Vector length
    pub dimensions: usize,
}

impl EmbedderFingerprint {
    /// Create a fingerprint
    pub fn new(provider: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            dimensions,
        }
    }
}

impl fmt::Display for EmbedderFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({} dims)", self.provider, self.model, self.dimensions)
    }
}

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OllamaEmbedder`: Local Ollama server (nomic-embed-text)
/// - `GeminiEmbedder`: Gemini API (text-embedding-004)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model(&self) -> &str;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Identity stored alongside the index
    fn fingerprint(&self) -> EmbedderFingerprint {
        EmbedderFingerprint::new(self.name(), self.model(), self.dimensions())
    }
}

/// Reject a provider response whose length differs from the configuration
pub(crate) fn check_embedding(
    provider: &str,
    expected: usize,
    embedding: Vec<f32>,
) -> Result<Vec<f32>> {
    if embedding.len() != expected {
        return Err(Error::embedding(format!(
            "{} returned {} dimensions, configured for {}",
            provider,
            embedding.len(),
            expected
        )));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(Error::embedding(format!(
            "{} returned a non-finite embedding component",
            provider
        )));
    }
    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_embedding() {
        assert_eq!(check_embedding("test", 2, vec![0.5, -1.0]).unwrap(), vec![0.5, -1.0]);
        assert!(matches!(
            check_embedding("test", 3, vec![0.5, -1.0]),
            Err(Error::Embedding(_))
        ));
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(matches!(
                check_embedding("test", 2, vec![bad, 1.0]),
                Err(Error::Embedding(_))
            ));
        }
    }
}
