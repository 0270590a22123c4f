//! Fake providers for pipeline and server tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use caselaw_rag::config::{RagConfig, RerankFailurePolicy};
use caselaw_rag::history::HistorySink;
use caselaw_rag::providers::{
    EmbeddingProvider, LlmProvider, ProviderError, RerankProvider, VectorStoreProvider,
};
use caselaw_rag::types::{Candidate, ChatHistoryRecord, SourceMetadata};
use caselaw_rag::{Error, PipelineParts, QueryPipeline, Result};

pub const DIMS: usize = 4;

pub fn candidate(n: usize, similarity: f32) -> Candidate {
    let case_id = format!("case-{}", n);
    Candidate {
        citation_string: format!("Case {} v Respondent [2020] eKLR", n),
        text_chunk: format!("Passage from case {}", n),
        similarity_score: similarity,
        source_metadata: SourceMetadata {
            vector_id: format!("vec-{}", n),
            case_title: Some(format!("Case {} v Respondent", n)),
            neutral_citation: Some("[2020] eKLR".to_string()),
            chunk_sequence: Some(1),
            ..Default::default()
        },
        case_id,
    }
}

pub struct FakeEmbedder {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::embedding("voyage 500: upstream unavailable"));
        }
        let seed = text.len() as f32;
        Ok((0..DIMS).map(|i| seed + i as f32).collect())
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn name(&self) -> &str {
        "fake-embedder"
    }

    fn model(&self) -> &str {
        "fake-law-embed"
    }
}

pub struct FakeIndex {
    pub matches: Vec<Candidate>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl VectorStoreProvider for FakeIndex {
    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    fn name(&self) -> &str {
        "fake-index"
    }
}

/// Scores documents by exact text; unknown text scores 0
pub struct FakeReranker {
    pub scores: HashMap<String, f32>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl RerankProvider for FakeReranker {
    async fn score(&self, _query: &str, documents: &[&str]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::rerank("rerank endpoint 503"));
        }
        Ok(documents
            .iter()
            .map(|d| self.scores.get(*d).copied().unwrap_or(0.0))
            .collect())
    }

    fn name(&self) -> &str {
        "fake-reranker"
    }

    fn model(&self) -> &str {
        "fake-rerank"
    }
}

pub enum Script {
    Answer(String),
    Transient,
    Permanent,
    Hang,
}

pub struct FakeLlm {
    pub name: &'static str,
    pub script: Script,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn new(name: &'static str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name,
            script,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(name: &'static str, answer: &str) -> Arc<Self> {
        Self::new(name, Script::Answer(answer.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn invoke(
        &self,
        prompt: &str,
        _max_tokens: u32,
    ) -> std::result::Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        match &self.script {
            Script::Answer(text) => Ok(text.clone()),
            Script::Transient => Err(ProviderError::transient("HTTP 503 Service Unavailable")),
            Script::Permanent => Err(ProviderError::permanent("HTTP 401 Unauthorized")),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }

    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

#[derive(Default)]
pub struct RecordingHistory {
    pub records: Mutex<Vec<ChatHistoryRecord>>,
}

#[async_trait]
impl HistorySink for RecordingHistory {
    async fn record(&self, record: &ChatHistoryRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub fn test_config() -> RagConfig {
    let mut config = RagConfig::default();
    config.embeddings.dimensions = DIMS;
    config.retrieval.top_k_candidates = 20;
    config.reranker.top_n = 3;
    config.response.max_citations = 5;
    config.generation.retry.max_attempts = 3;
    config.generation.retry.base_delay_ms = 0;
    config.generation.retry.max_delay_ms = 0;
    config.pipeline.request_timeout_secs = 5;
    // Generation providers come from the harness; keep one entry so validation passes
    config.generation.providers.truncate(1);
    config
}

/// Everything a test may want to inspect after running the pipeline
pub struct Harness {
    pub pipeline: QueryPipeline,
    pub embedder: Arc<FakeEmbedder>,
    pub index: Arc<FakeIndex>,
    pub reranker: Arc<FakeReranker>,
    pub history: Arc<RecordingHistory>,
}

impl Harness {
    pub fn network_calls(&self) -> usize {
        self.embedder.calls.load(Ordering::SeqCst)
            + self.index.calls.load(Ordering::SeqCst)
            + self.reranker.calls.load(Ordering::SeqCst)
    }
}

pub struct HarnessBuilder {
    pub config: RagConfig,
    pub matches: Vec<Candidate>,
    pub rerank_scores: HashMap<String, f32>,
    pub embed_fails: bool,
    pub rerank_fails: bool,
    pub llms: Vec<Arc<dyn LlmProvider>>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            matches: Vec::new(),
            rerank_scores: HashMap::new(),
            embed_fails: false,
            rerank_fails: false,
            llms: Vec::new(),
        }
    }

    /// Five candidates; the reranker promotes 3, 1, 2 with 0.95, 0.92, 0.88
    pub fn smith_v_jones(mut self) -> Self {
        self.matches = [0.9, 0.85, 0.8, 0.75, 0.7]
            .iter()
            .enumerate()
            .map(|(i, s)| candidate(i + 1, *s))
            .collect();
        for (n, score) in [(3, 0.95), (1, 0.92), (2, 0.88), (4, 0.2), (5, 0.1)] {
            self.rerank_scores
                .insert(format!("Passage from case {}", n), score);
        }
        self
    }

    pub fn llm(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.llms.push(provider);
        self
    }

    pub fn build(self) -> Harness {
        let embedder = Arc::new(FakeEmbedder {
            calls: AtomicUsize::new(0),
            fail: self.embed_fails,
        });
        let index = Arc::new(FakeIndex {
            matches: self.matches,
            calls: AtomicUsize::new(0),
        });
        let reranker = Arc::new(FakeReranker {
            scores: self.rerank_scores,
            fail: self.rerank_fails,
            calls: AtomicUsize::new(0),
        });
        let history = Arc::new(RecordingHistory::default());

        let parts = PipelineParts {
            embedder: embedder.clone(),
            vector_store: index.clone(),
            reranker: reranker.clone(),
            llm_providers: self.llms,
            history: history.clone(),
        };
        let pipeline = QueryPipeline::from_parts(Arc::new(self.config), parts)
            .expect("valid test pipeline");

        Harness {
            pipeline,
            embedder,
            index,
            reranker,
            history,
        }
    }
}

pub fn retrieval_order(mut builder: HarnessBuilder) -> HarnessBuilder {
    builder.config.reranker.on_failure = RerankFailurePolicy::RetrievalOrder;
    builder.rerank_fails = true;
    builder
}
