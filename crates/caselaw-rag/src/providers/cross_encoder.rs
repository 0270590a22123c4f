//! HTTP cross-encoder reranker
//!
//! Speaks the `/rerank` shape shared by Voyage and Cohere: the request carries
//! the query and the raw passages, the response lists `{index, relevance_score}`
//! pairs under `data` (Voyage) or `results` (Cohere).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RerankerConfig;
use crate::error::{Error, Result};

use super::reranker::RerankProvider;

/// Reranker calling a hosted cross-encoder
pub struct HttpCrossEncoder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: &'a [&'a str],
    model: &'a str,
}

#[derive(Deserialize)]
struct RerankResponse {
    #[serde(alias = "results")]
    data: Vec<RerankScore>,
}

#[derive(Deserialize)]
struct RerankScore {
    index: usize,
    relevance_score: f32,
}

impl HttpCrossEncoder {
    pub fn new(client: Client, config: &RerankerConfig, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Map `(index, score)` pairs back onto input order
fn scores_in_input_order(scores: Vec<RerankScore>, count: usize) -> Result<Vec<f32>> {
    let mut ordered: Vec<Option<f32>> = vec![None; count];
    for score in scores {
        let slot = ordered.get_mut(score.index).ok_or_else(|| {
            Error::rerank(format!(
                "Rerank score index {} out of range for {} documents",
                score.index, count
            ))
        })?;
        *slot = Some(score.relevance_score);
    }

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, s)| s.ok_or_else(|| Error::rerank(format!("No rerank score for document {}", i))))
        .collect()
}

#[async_trait]
impl RerankProvider for HttpCrossEncoder {
    async fn score(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>> {
        let request = RerankRequest {
            query,
            documents,
            model: &self.model,
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::rerank(format!("Rerank request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::rerank(format!("Rerank failed ({}): {}", status, body)));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| Error::rerank(format!("Failed to parse rerank response: {}", e)))?;

        scores_in_input_order(parsed.data, documents.len())
    }

    fn name(&self) -> &str {
        "cross-encoder"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
