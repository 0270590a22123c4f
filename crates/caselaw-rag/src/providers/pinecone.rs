//! Pinecone vector index client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::{MetadataFields, VectorIndexConfig};
use crate::error::{Error, Result};
use crate::types::{Candidate, SourceMetadata};

use super::http::join_url;
use super::vector_store::VectorStoreProvider;

/// Read-only query client for a Pinecone index
pub struct PineconeIndex {
    client: Client,
    endpoint: String,
    api_key: String,
    namespace: Option<String>,
    fields: MetadataFields,
    timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl PineconeIndex {
    pub fn new(client: Client, config: &VectorIndexConfig, api_key: String) -> Self {
        Self {
            client,
            endpoint: join_url(&config.host, "query"),
            api_key,
            namespace: config.namespace.clone(),
            fields: config.fields.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Convert one index match; matches without metadata carry no text and are dropped
    fn to_candidate(&self, m: Match) -> Option<Candidate> {
        let mut metadata = m.metadata?;

        let text = take_string(&mut metadata, &self.fields.text).unwrap_or_default();
        let case_id = take_string(&mut metadata, &self.fields.case_id)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| m.id.clone());
        let case_title = take_string(&mut metadata, &self.fields.case_title);
        let neutral_citation = take_string(&mut metadata, &self.fields.neutral_citation);
        let chunk_sequence = metadata
            .remove(&self.fields.chunk_sequence)
            .and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            });

        let citation_string = Candidate::format_citation(
            &case_id,
            case_title.as_deref(),
            neutral_citation.as_deref(),
        );

        Some(Candidate {
            case_id,
            text_chunk: text,
            citation_string,
            similarity_score: m.score,
            source_metadata: SourceMetadata {
                vector_id: m.id,
                case_title,
                neutral_citation,
                chunk_sequence,
                extra: metadata,
            },
        })
    }
}

fn take_string(metadata: &mut Map<String, Value>, key: &str) -> Option<String> {
    match metadata.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl VectorStoreProvider for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<Candidate>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Api-Key", &self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("Pinecone request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::retrieval(format!(
                "Pinecone query failed ({}): {}",
                status, body
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("Failed to parse Pinecone response: {}", e)))?;

        let total = parsed.matches.len();
        let candidates: Vec<Candidate> = parsed
            .matches
            .into_iter()
            .filter_map(|m| self.to_candidate(m))
            .collect();

        if candidates.len() < total {
            tracing::debug!(
                dropped = total - candidates.len(),
                "Skipped index matches without metadata"
            );
        }

        Ok(candidates)
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
