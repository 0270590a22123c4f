//! Cross-encoder reranking of retrieved candidates

use std::sync::Arc;

use crate::config::RerankFailurePolicy;
use crate::error::{Error, Result};
use crate::providers::RerankProvider;
use crate::types::{Candidate, RankedPassage};

/// Rescores candidates against the query and keeps the best `top_n`
pub struct Reranker {
    provider: Arc<dyn RerankProvider>,
    on_failure: RerankFailurePolicy,
}

impl Reranker {
    pub fn new(provider: Arc<dyn RerankProvider>, on_failure: RerankFailurePolicy) -> Self {
        Self {
            provider,
            on_failure,
        }
    }

    /// Rerank candidates by cross-encoder relevance, descending and stable
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_n: usize,
    ) -> Result<Vec<RankedPassage>> {
        if top_n == 0 {
            return Err(Error::invalid_input("top_n must be positive"));
        }
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        match self.score(query, &candidates).await {
            Ok(scores) => {
                let mut ranked: Vec<RankedPassage> = candidates
                    .into_iter()
                    .zip(scores)
                    .map(|(candidate, score)| RankedPassage::new(candidate, score))
                    .collect();
                ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
                ranked.truncate(top_n);

                tracing::debug!(
                    model = self.provider.model(),
                    kept = ranked.len(),
                    top_score = ?ranked.first().map(|p| p.relevance_score),
                    "Candidates reranked"
                );
                Ok(ranked)
            }
            Err(e) => match self.on_failure {
                RerankFailurePolicy::Fail => Err(e),
                RerankFailurePolicy::RetrievalOrder => {
                    tracing::warn!(
                        error = %e,
                        "Reranker unavailable, falling back to retrieval order"
                    );
                    Ok(candidates
                        .into_iter()
                        .take(top_n)
                        .map(|candidate| {
                            let score = candidate.similarity_score;
                            RankedPassage::new(candidate, score)
                        })
                        .collect())
                }
            },
        }
    }

    async fn score(&self, query: &str, candidates: &[Candidate]) -> Result<Vec<f32>> {
        let documents: Vec<&str> = candidates.iter().map(|c| c.text_chunk.as_str()).collect();
        let scores = self.provider.score(query, &documents).await?;
        if scores.len() != documents.len() {
            return Err(Error::rerank(format!(
                "{} returned {} scores for {} documents",
                self.provider.name(),
                scores.len(),
                documents.len()
            )));
        }
        Ok(scores)
    }
}
