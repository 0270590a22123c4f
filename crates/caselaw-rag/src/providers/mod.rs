//! Provider abstractions for embeddings, vector index, reranking and generation
//!
//! Every external service sits behind a trait so the pipeline is written once
//! against the capability and never against a vendor SDK.

pub mod anthropic;
pub mod cross_encoder;
pub mod embedding;
pub mod http;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod pinecone;
pub mod reranker;
pub mod vector_store;
pub mod voyage;

pub use embedding::EmbeddingProvider;
pub use llm::{FailureKind, LlmProvider, ProviderError};
pub use reranker::RerankProvider;
pub use vector_store::VectorStoreProvider;

use reqwest::Client;
use std::sync::Arc;

use crate::config::{
    EmbeddingBackend, EmbeddingConfig, GenerationConfig, ProviderKind, RerankerConfig,
    VectorIndexConfig,
};
use crate::error::{Error, Result};

/// Build the query embedder for the configured backend
pub fn build_embedder(
    client: Client,
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.backend {
        EmbeddingBackend::Voyage => {
            let api_key = http::require_api_key(&config.api_key_env)?;
            Arc::new(voyage::VoyageEmbedder::new(client, config, api_key))
        }
        EmbeddingBackend::Ollama => Arc::new(ollama::OllamaEmbedder::new(client, config)),
    };
    tracing::info!(
        provider = embedder.name(),
        model = embedder.model(),
        dimensions = embedder.dimensions(),
        "Embedder initialized"
    );
    Ok(embedder)
}

/// Build the vector index client
pub fn build_vector_store(
    client: Client,
    config: &VectorIndexConfig,
) -> Result<Arc<dyn VectorStoreProvider>> {
    let api_key = http::require_api_key(&config.api_key_env)?;
    tracing::info!(
        index = %config.index_name,
        region = %config.region,
        "Vector index client initialized"
    );
    Ok(Arc::new(pinecone::PineconeIndex::new(client, config, api_key)))
}

/// Build the cross-encoder client; the API key is optional for self-hosted endpoints
pub fn build_reranker(client: Client, config: &RerankerConfig) -> Arc<dyn RerankProvider> {
    let api_key = http::api_key_from_env(&config.api_key_env);
    if api_key.is_none() {
        tracing::warn!(
            var = %config.api_key_env,
            "Reranker API key not set, calling endpoint without auth"
        );
    }
    tracing::info!(model = %config.model, top_n = config.top_n, "Reranker initialized");
    Arc::new(cross_encoder::HttpCrossEncoder::new(client, config, api_key))
}

/// Build generation providers in priority order
///
/// Providers whose API key is missing are skipped with a warning; an empty
/// result is a configuration error.
pub fn build_llm_providers(
    client: Client,
    config: &GenerationConfig,
) -> Result<Vec<Arc<dyn LlmProvider>>> {
    let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();

    for provider_config in config.ordered_providers() {
        let api_key = match provider_config.api_key_env() {
            Some(var) => match http::api_key_from_env(&var) {
                Some(key) => Some(key),
                None => {
                    tracing::warn!(
                        provider = provider_config.provider.as_str(),
                        model = %provider_config.model_name,
                        "Skipping provider due to missing {}",
                        var
                    );
                    continue;
                }
            },
            None => None,
        };

        let temperature = provider_config.temperature.unwrap_or(config.temperature);
        let provider: Arc<dyn LlmProvider> = match (provider_config.provider, api_key) {
            (ProviderKind::OpenAi | ProviderKind::Groq | ProviderKind::Together, Some(key)) => {
                Arc::new(openai::OpenAiCompatible::new(
                    client.clone(),
                    &provider_config,
                    key,
                    temperature,
                ))
            }
            (ProviderKind::Anthropic, Some(key)) => Arc::new(anthropic::AnthropicClient::new(
                client.clone(),
                &provider_config,
                key,
                temperature,
            )),
            (ProviderKind::Ollama, _) => Arc::new(ollama::OllamaLlm::new(
                client.clone(),
                &provider_config,
                temperature,
            )),
            (kind, None) => {
                return Err(Error::config(format!(
                    "Provider {} requires an API key variable",
                    kind.as_str()
                )))
            }
        };

        tracing::info!(
            rank = providers.len() + 1,
            provider = %provider.label(),
            "Generation provider initialized"
        );
        providers.push(provider);
    }

    if providers.is_empty() {
        return Err(Error::config(
            "No generation providers available. Check API keys and generation.providers",
        ));
    }

    Ok(providers)
}
