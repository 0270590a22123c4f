//! Error types for the case-law RAG pipeline

use std::time::Duration;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or empty query (user-correctable)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedding service failure
    #[error("Embedding service error: {0}")]
    Embedding(String),

    /// Vector index failure
    #[error("Retrieval service error: {0}")]
    Retrieval(String),

    /// Cross-encoder scoring failure
    #[error("Rerank service error: {0}")]
    Rerank(String),

    /// No passages survived retrieval, rerank and dedup
    #[error("No relevant sources found")]
    EmptyContext,

    /// Every configured generation provider failed
    #[error("All generation providers failed after {attempts} attempt(s): {last_error}")]
    GenerationExhausted { attempts: usize, last_error: String },

    /// Request deadline exceeded
    #[error("Request deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chat history storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a retrieval error
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }

    /// Create a rerank error
    pub fn rerank(message: impl Into<String>) -> Self {
        Self::Rerank(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::Embedding(_) => "embedding_service_error",
            Error::Retrieval(_) => "retrieval_service_error",
            Error::Rerank(_) => "rerank_service_error",
            Error::EmptyContext => "empty_context",
            Error::GenerationExhausted { .. } => "generation_exhausted",
            Error::Timeout(_) => "timeout",
            Error::Config(_) => "config_error",
            Error::Storage(_) => "storage_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Message shown to the caller. Upstream detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidInput(msg) => msg.clone(),
            Error::EmptyContext => crate::types::NO_RELEVANT_CASES.to_string(),
            Error::GenerationExhausted { .. } => {
                "Unable to generate a response, please retry.".to_string()
            }
            Error::Timeout(_) => "The request timed out, please retry.".to_string(),
            _ => "Service unavailable, please retry later.".to_string(),
        }
    }
}
