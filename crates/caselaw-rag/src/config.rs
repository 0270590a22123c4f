//! Configuration for the case-law RAG pipeline
//!
//! Loaded once at startup from a TOML file, validated, then shared read-only
//! behind an `Arc` for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::generation::RetryPolicy;

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Query embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Vector index configuration
    pub vector_index: VectorIndexConfig,
    /// Candidate retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Cross-encoder reranker configuration
    pub reranker: RerankerConfig,
    /// Answer generation configuration
    pub generation: GenerationConfig,
    /// Response shaping configuration
    pub response: ResponseConfig,
    /// End-to-end request limits
    pub pipeline: PipelineConfig,
    /// Chat history sink
    pub history: HistoryConfig,
}

impl RagConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::config(format!("Invalid TOML: {}", e)))
    }

    /// Read configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from an optional file (defaults otherwise) and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        positive("embeddings.dimensions", self.embeddings.dimensions)?;
        non_empty("embeddings.model", &self.embeddings.model)?;
        non_empty("vector_index.host", &self.vector_index.host)?;
        positive("retrieval.top_k_candidates", self.retrieval.top_k_candidates)?;
        non_empty("reranker.model", &self.reranker.model)?;
        positive("reranker.top_n", self.reranker.top_n)?;
        positive("generation.max_tokens", self.generation.max_tokens as usize)?;
        positive("response.max_citations", self.response.max_citations)?;
        positive("generation.retry.max_attempts", self.generation.retry.max_attempts as usize)?;
        positive("pipeline.request_timeout_secs", self.pipeline.request_timeout_secs as usize)?;

        if self.generation.retry.base_delay_ms > self.generation.retry.max_delay_ms {
            return Err(Error::config(
                "generation.retry.base_delay_ms must not exceed max_delay_ms",
            ));
        }

        if self.generation.providers.is_empty() {
            return Err(Error::config("generation.providers must not be empty"));
        }
        for (i, provider) in self.generation.providers.iter().enumerate() {
            non_empty(&format!("generation.providers[{}].model_name", i), &provider.model_name)?;
        }

        // With several providers, the primary's full retry run must leave time to fail over
        let ordered = self.generation.ordered_providers();
        if let [primary, _, ..] = ordered.as_slice() {
            let budget = self.generation.retry.worst_case(primary.timeout());
            if budget >= self.request_deadline() {
                return Err(Error::config(format!(
                    "{}/{} can take {}s across {} attempts, which leaves no time to fail over \
                     within pipeline.request_timeout_secs = {}",
                    primary.provider.as_str(),
                    primary.model_name,
                    budget.as_secs(),
                    self.generation.retry.max_attempts,
                    self.pipeline.request_timeout_secs
                )));
            }
        }

        Ok(())
    }

    /// Overall request deadline
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.pipeline.request_timeout_secs)
    }
}

fn positive(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(Error::config(format!("{} must be a positive integer", field)));
    }
    Ok(())
}

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::config(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Voyage AI embeddings API
    #[default]
    Voyage,
    /// Local Ollama server
    Ollama,
}

/// Query embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend serving the model
    pub backend: EmbeddingBackend,
    /// Model identifier (default: voyage-law-2)
    pub model: String,
    /// Embedding dimensions (1024 for voyage-law-2)
    pub dimensions: usize,
    /// Service base URL
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Voyage,
            model: "voyage-law-2".to_string(),
            dimensions: 1024,
            base_url: "https://api.voyageai.com/v1".to_string(),
            api_key_env: "VOYAGE_API_KEY".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Metadata field names stored alongside each vector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataFields {
    pub text: String,
    pub case_id: String,
    pub case_title: String,
    pub neutral_citation: String,
    pub chunk_sequence: String,
}

impl Default for MetadataFields {
    fn default() -> Self {
        Self {
            text: "text".to_string(),
            case_id: "case_id".to_string(),
            case_title: "case_title".to_string(),
            neutral_citation: "media_neutral_citation".to_string(),
            chunk_sequence: "chunk_sequence".to_string(),
        }
    }
}

/// Vector index configuration (Pinecone)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorIndexConfig {
    /// Index name
    pub index_name: String,
    /// Index data-plane host, e.g. "https://caselaw-abc123.svc.us-east-1-aws.pinecone.io"
    pub host: String,
    /// Optional namespace within the index
    pub namespace: Option<String>,
    /// Cloud region
    pub region: String,
    /// Cloud provider
    pub cloud: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Metadata field names
    pub fields: MetadataFields,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            index_name: "caselaw".to_string(),
            host: "https://caselaw.svc.us-east-1-aws.pinecone.io".to_string(),
            namespace: None,
            region: "us-east-1".to_string(),
            cloud: "aws".to_string(),
            api_key_env: "PINECONE_API_KEY".to_string(),
            timeout_secs: 10,
            fields: MetadataFields::default(),
        }
    }
}

/// Candidate retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of nearest chunks requested from the index
    pub top_k_candidates: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k_candidates: 20 }
    }
}

/// What the pipeline does when the reranker fails
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RerankFailurePolicy {
    /// Abort the request with a rerank error
    #[default]
    Fail,
    /// Keep retrieval order and log the degradation
    RetrievalOrder,
}

/// Cross-encoder reranker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerConfig {
    /// Reranker model identifier
    pub model: String,
    /// Passages kept after reranking
    pub top_n: usize,
    /// Rerank endpoint URL
    pub endpoint: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Behaviour on scoring failure
    pub on_failure: RerankFailurePolicy,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            model: "rerank-2".to_string(),
            top_n: 5,
            endpoint: "https://api.voyageai.com/v1/rerank".to_string(),
            api_key_env: "VOYAGE_API_KEY".to_string(),
            timeout_secs: 15,
            on_failure: RerankFailurePolicy::Fail,
        }
    }
}

/// Generation vendor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Groq,
    Together,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    /// Lowercase provider name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::Together => "together",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Vendor API base URL
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::Together => "https://api.together.xyz/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com/v1",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    /// Conventional API key variable, `None` for keyless local servers
    pub fn default_api_key_env(&self) -> Option<String> {
        match self {
            ProviderKind::Ollama => None,
            other => Some(format!("{}_API_KEY", other.as_str().to_uppercase())),
        }
    }
}

/// One generation target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model name sent to the vendor
    pub model_name: String,
    /// Vendor
    pub provider: ProviderKind,
    /// Explicit priority (lower first); list order breaks ties
    #[serde(default)]
    pub priority: Option<u32>,
    /// Override for the vendor base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Override for the API key variable
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
    /// Override for `generation.temperature`
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_provider_timeout() -> u64 {
    30
}

impl ProviderConfig {
    pub fn new(provider: ProviderKind, model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            provider,
            priority: None,
            base_url: None,
            api_key_env: None,
            timeout_secs: default_provider_timeout(),
            temperature: None,
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }

    pub fn api_key_env(&self) -> Option<String> {
        self.api_key_env
            .clone()
            .or_else(|| self.provider.default_api_key_env())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry policy applied per provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per provider, first try included
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay_ms: u64,
    /// Backoff cap
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// Longest one provider can hold a request: every attempt timing out, plus backoff
    pub fn worst_case(&self, attempt_timeout: Duration) -> Duration {
        let policy = RetryPolicy::from(self);
        (1..policy.max_attempts).fold(
            attempt_timeout.saturating_mul(policy.max_attempts),
            |total, attempt| total.saturating_add(policy.delay_for(attempt)),
        )
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 10_000,
        }
    }
}

/// Answer generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum completion tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Providers in priority order
    pub providers: Vec<ProviderConfig>,
    /// Retry policy
    pub retry: RetryConfig,
}

impl GenerationConfig {
    /// Providers sorted by explicit priority, list order otherwise
    pub fn ordered_providers(&self) -> Vec<ProviderConfig> {
        let mut providers = self.providers.clone();
        providers.sort_by_key(|p| p.priority.unwrap_or(u32::MAX));
        providers
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.1,
            providers: vec![
                ProviderConfig::new(ProviderKind::Together, "deepseek-ai/DeepSeek-V3"),
                ProviderConfig::new(ProviderKind::Groq, "llama-3.3-70b-versatile"),
                ProviderConfig::new(ProviderKind::OpenAi, "gpt-4o-mini"),
                ProviderConfig::new(ProviderKind::Anthropic, "claude-3-5-haiku-latest"),
            ],
            retry: RetryConfig::default(),
        }
    }
}

/// Response shaping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Hard cap on distinct sources in an answer
    pub max_citations: usize,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self { max_citations: 5 }
    }
}

/// End-to-end request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Overall deadline for one query in seconds
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
        }
    }
}

/// Chat history sink configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// SQLite file for chat history; history is not recorded when unset
    pub sqlite_path: Option<PathBuf>,
}
