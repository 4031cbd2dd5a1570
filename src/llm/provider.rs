use async_trait::async_trait;

use super::types::{CompletionOptions, PromptMessage};
use crate::core::errors::ApiError;

/// Seam to the hosted model provider.
///
/// The service only needs two remote functions: a chat completion over a
/// message list, and a batch embedding call. Both are synchronous from the
/// caller's perspective; retries and fallbacks live with the caller.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// provider name for health reporting (e.g. "openai")
    fn name(&self) -> &str;

    /// check if the provider is reachable
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// chat completion (non-streaming)
    async fn chat(
        &self,
        messages: Vec<PromptMessage>,
        options: &CompletionOptions,
    ) -> Result<String, ApiError>;

    /// generate embeddings for a batch of texts, one vector per input
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}
