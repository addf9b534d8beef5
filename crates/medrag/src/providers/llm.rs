//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for hosted answer generation
///
/// Implementations:
/// - `GeminiClient`: Gemini `generateContent` API
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a fully composed prompt.
    ///
    /// An empty string means the model produced no answer (e.g. it was
    /// blocked); transport and API failures are errors.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
