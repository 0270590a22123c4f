//! Embedding provider trait for query embeddings

use async_trait::async_trait;
use crate::error::Result;

/// Trait for generating query embeddings
///
/// Implementations:
/// - `VoyageEmbedder`: Voyage AI (voyage-law-2)
/// - `OllamaEmbedder`: Local Ollama server
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single query text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimensions (1024 for voyage-law-2)
    fn dimensions(&self) -> usize;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
