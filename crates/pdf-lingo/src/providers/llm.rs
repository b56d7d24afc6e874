//! LLM provider trait for text generation

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt-in, text-out generation
///
/// Implementations:
/// - `GeminiClient`: Google Generative Language API
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a reply for a single-turn prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is reachable with the configured credentials
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
