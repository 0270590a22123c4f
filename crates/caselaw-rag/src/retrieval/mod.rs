//! Query embedding, nearest-neighbour retrieval and cross-encoder reranking

pub mod rerank;

pub use rerank::Reranker;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{Candidate, EmbeddingVector};

/// Converts query text into a dense vector
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Embed a query
    ///
    /// Blank text is rejected before any call is made. The returned vector
    /// always has the configured dimension.
    pub async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::invalid_input("Query must not be empty"));
        }

        let vector = self.provider.embed(text).await?;

        if vector.is_empty() {
            return Err(Error::embedding(format!(
                "{} returned an empty embedding",
                self.provider.name()
            )));
        }
        let expected = self.provider.dimensions();
        if vector.len() != expected {
            return Err(Error::embedding(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                expected,
                vector.len()
            )));
        }

        tracing::debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            dimensions = vector.len(),
            "Query embedded"
        );
        Ok(vector)
    }
}

/// Fetches the nearest case-law chunks for a query vector
pub struct VectorRetriever {
    store: Arc<dyn VectorStoreProvider>,
}

impl VectorRetriever {
    pub fn new(store: Arc<dyn VectorStoreProvider>) -> Self {
        Self { store }
    }

    /// Up to `top_k` candidates, similarity descending
    ///
    /// Equal scores keep the order the index returned them in.
    pub async fn retrieve(&self, vector: &[f32], top_k: usize) -> Result<Vec<Candidate>> {
        if top_k == 0 {
            return Err(Error::invalid_input("top_k must be positive"));
        }
        if vector.is_empty() {
            return Err(Error::invalid_input("Query vector must not be empty"));
        }

        let mut candidates = self.store.query(vector, top_k).await?;

        // sort_by is stable
        candidates.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        candidates.truncate(top_k);

        tracing::debug!(
            store = self.store.name(),
            top_k,
            returned = candidates.len(),
            "Candidates retrieved"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::{Error, Result};
    use crate::providers::{EmbeddingProvider, VectorStoreProvider};
    use crate::types::{Candidate, SourceMetadata};

    pub fn candidate(case_id: &str, similarity: f32) -> Candidate {
        Candidate {
            case_id: case_id.to_string(),
            text_chunk: format!("Holding in {}", case_id),
            citation_string: format!("{} [2020] eKLR", case_id),
            similarity_score: similarity,
            source_metadata: SourceMetadata {
                vector_id: format!("vec-{}", case_id),
                ..Default::default()
            },
        }
    }

    pub struct FixedEmbedder {
        pub vector: Vec<f32>,
        pub dimensions: usize,
        pub calls: AtomicUsize,
    }

    impl FixedEmbedder {
        pub fn new(vector: Vec<f32>, dimensions: usize) -> Self {
            Self {
                vector,
                dimensions,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector.clone())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed-model"
        }
    }

    pub struct FixedIndex {
        pub matches: Vec<Candidate>,
        pub fail: bool,
    }

    #[async_trait]
    impl VectorStoreProvider for FixedIndex {
        async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<Candidate>> {
            if self.fail {
                return Err(Error::retrieval("index unavailable"));
            }
            Ok(self.matches.clone())
        }

        fn name(&self) -> &str {
            "fixed-index"
        }
    }
}
