//! Vector index provider trait

use async_trait::async_trait;
use crate::error::Result;
use crate::types::Candidate;

/// Trait for nearest-neighbour queries against the case-law index
///
/// Implementations:
/// - `PineconeIndex`: Pinecone serverless index
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Return up to `top_k` matches in the order the index produced them
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Candidate>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
