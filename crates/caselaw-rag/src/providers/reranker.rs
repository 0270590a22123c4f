//! Cross-encoder reranking provider trait

use async_trait::async_trait;
use crate::error::Result;

/// Trait for scoring (query, passage) pairs
///
/// Implementations:
/// - `HttpCrossEncoder`: Voyage / Cohere style `/rerank` endpoints
#[async_trait]
pub trait RerankProvider: Send + Sync {
    /// One relevance score per document, in input order
    async fn score(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
