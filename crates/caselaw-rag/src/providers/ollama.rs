//! Ollama-based providers for embeddings and generation
//!
//! Both wrap one `OllamaClient`; retries are left to the generation
//! orchestrator, and the embedder fails fast.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingConfig, ProviderConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::http::join_url;
use super::llm::{LlmProvider, ProviderError};

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Generate an embedding
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = join_url(&self.base_url, "api/embeddings");
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&EmbedRequest { model, prompt: text })
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Ollama embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::embedding(format!(
                "Ollama embedding failed: HTTP {}",
                response.status()
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        Ok(embed_response.embedding)
    }

    /// Complete a prompt without streaming
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> std::result::Result<String, ProviderError> {
        let url = join_url(&self.base_url, "api/generate");
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let generate_response: GenerateResponse = response.json().await?;
        if generate_response.response.trim().is_empty() {
            return Err(ProviderError::permanent("empty completion"));
        }
        Ok(generate_response.response)
    }
}

/// Ollama embedding provider
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: Client, config: &EmbeddingConfig) -> Self {
        Self {
            client: Arc::new(OllamaClient::new(
                client,
                config.base_url.clone(),
                Duration::from_secs(config.timeout_secs),
            )),
            dimensions: config.dimensions,
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.model, text).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
}

impl OllamaLlm {
    pub fn new(client: Client, config: &ProviderConfig, temperature: f32) -> Self {
        Self {
            client: Arc::new(OllamaClient::new(
                client,
                config.base_url(),
                Duration::from_secs(config.timeout_secs),
            )),
            model: config.model_name.clone(),
            temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn invoke(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> std::result::Result<String, ProviderError> {
        self.client
            .generate(&self.model, prompt, self.temperature, max_tokens)
            .await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
