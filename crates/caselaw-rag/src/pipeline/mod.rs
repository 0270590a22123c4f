//! Query pipeline controller
//!
//! Drives embed, retrieve, rerank, assemble and generate for one query and
//! turns every internal failure into the response's `error` field.

use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{ContextAssembler, GenerationOrchestrator, RetryPolicy};
use crate::history::{HistorySink, NoopHistory, SqliteHistory};
use crate::providers::{
    self, EmbeddingProvider, LlmProvider, RerankProvider, VectorStoreProvider,
};
use crate::retrieval::{Embedder, Reranker, VectorRetriever};
use crate::types::{ChatHistoryRecord, GenerationResult, Outcome, Query};

/// External collaborators the pipeline is assembled from
pub struct PipelineParts {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub vector_store: Arc<dyn VectorStoreProvider>,
    pub reranker: Arc<dyn RerankProvider>,
    /// Generation providers in priority order
    pub llm_providers: Vec<Arc<dyn LlmProvider>>,
    pub history: Arc<dyn HistorySink>,
}

/// The full retrieval-rerank-generate chain
pub struct QueryPipeline {
    config: Arc<RagConfig>,
    embedder: Embedder,
    retriever: VectorRetriever,
    reranker: Reranker,
    assembler: ContextAssembler,
    orchestrator: GenerationOrchestrator,
    history: Arc<dyn HistorySink>,
}

impl QueryPipeline {
    /// Build every provider from configuration, sharing one HTTP client
    pub fn from_config(config: Arc<RagConfig>) -> Result<Self> {
        let client = providers::http::build_client()?;

        let history: Arc<dyn HistorySink> = match &config.history.sqlite_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Chat history stored in SQLite");
                Arc::new(SqliteHistory::new(path)?)
            }
            None => Arc::new(NoopHistory),
        };

        let parts = PipelineParts {
            embedder: providers::build_embedder(client.clone(), &config.embeddings)?,
            vector_store: providers::build_vector_store(client.clone(), &config.vector_index)?,
            reranker: providers::build_reranker(client.clone(), &config.reranker),
            llm_providers: providers::build_llm_providers(client, &config.generation)?,
            history,
        };

        Self::from_parts(config, parts)
    }

    /// Assemble from explicit parts
    pub fn from_parts(config: Arc<RagConfig>, parts: PipelineParts) -> Result<Self> {
        config.validate()?;
        if parts.llm_providers.is_empty() {
            return Err(Error::config("At least one generation provider is required"));
        }
        if parts.embedder.dimensions() != config.embeddings.dimensions {
            return Err(Error::config(format!(
                "Embedder reports {} dimensions, configuration expects {}",
                parts.embedder.dimensions(),
                config.embeddings.dimensions
            )));
        }

        let orchestrator = GenerationOrchestrator::new(
            parts.llm_providers,
            RetryPolicy::from(&config.generation.retry),
        )?;

        Ok(Self {
            embedder: Embedder::new(parts.embedder),
            retriever: VectorRetriever::new(parts.vector_store),
            reranker: Reranker::new(parts.reranker, config.reranker.on_failure),
            assembler: ContextAssembler::new(),
            orchestrator,
            history: parts.history,
            config,
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Generation providers in failover order
    pub fn provider_labels(&self) -> Vec<String> {
        self.orchestrator.provider_labels()
    }

    /// Answer one query
    ///
    /// Always returns a well-formed result. Blank queries are rejected before
    /// any network call, and the whole chain runs under the request deadline.
    pub async fn handle_query(&self, query_text: &str, requester_id: &str) -> GenerationResult {
        let query = Query::new(query_text, requester_id);
        let span = tracing::info_span!(
            "query",
            request_id = %query.id,
            requester = %query.requester_id
        );

        async {
            if query.is_blank() {
                let err = Error::invalid_input("Query must not be empty");
                tracing::info!(kind = err.kind(), "Query rejected");
                return GenerationResult::rejected(err.user_message());
            }

            let started = Instant::now();
            let budget = self.config.request_deadline();
            let deadline = started + budget;

            let result = match tokio::time::timeout(budget, self.run(&query, deadline)).await {
                Ok(Ok(result)) => result,
                Ok(Err(err)) => self.map_error(err),
                Err(_) => self.map_error(Error::Timeout(budget)),
            };

            tracing::info!(
                outcome = ?result.outcome,
                provider = result.provider_used.as_deref().unwrap_or("-"),
                citations = result.citations.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Query finished"
            );

            self.emit_history(&query, &result).await;
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, query: &Query, deadline: Instant) -> Result<GenerationResult> {
        let text = query.trimmed();

        let vector = self.embedder.embed(text).await?;

        let candidates = self
            .retriever
            .retrieve(&vector, self.config.retrieval.top_k_candidates)
            .await?;
        tracing::info!(candidates = candidates.len(), "Retrieval complete");

        let ranked = self
            .reranker
            .rerank(text, candidates, self.config.reranker.top_n)
            .await?;

        let context = self
            .assembler
            .assemble(ranked, self.config.response.max_citations)?;
        tracing::info!(sources = context.len(), "Context assembled");

        Ok(self
            .orchestrator
            .generate(text, &context, self.config.generation.max_tokens, deadline)
            .await)
    }

    fn map_error(&self, err: Error) -> GenerationResult {
        match err {
            Error::EmptyContext => {
                tracing::info!("No relevant sources found");
                GenerationResult::no_relevant_sources()
            }
            Error::InvalidInput(_) => {
                tracing::info!(kind = err.kind(), "{}", err);
                GenerationResult::rejected(err.user_message())
            }
            err => {
                tracing::error!(kind = err.kind(), "{}", err);
                GenerationResult::failed(err.user_message(), Vec::new())
            }
        }
    }

    async fn emit_history(&self, query: &Query, result: &GenerationResult) {
        if !matches!(result.outcome, Outcome::Completed | Outcome::NoRelevantSources) {
            return;
        }

        let record = ChatHistoryRecord::from_result(&query.requester_id, &query.text, result);
        if let Err(e) = self.history.record(&record).await {
            tracing::warn!(sink = self.history.name(), error = %e, "Failed to store chat history");
        }
    }
}
