//! Generation oracle trait: prompt in, answer text out

use async_trait::async_trait;
use crate::error::Result;

/// External text-generation service
///
/// Failures are returned as errors and recovered by the query engine, which
/// answers with a fixed degraded response instead.
///
/// Implementations:
/// - `OllamaOracle`: local Ollama server (phi3, llama3, etc.)
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    /// Turn an assembled prompt into an answer
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the service is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
