//! Generation provider trait

use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt;

/// Whether a failed call is worth retrying against the same provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, 5xx, rate limit, connection reset
    Transient,
    /// Auth error, malformed request, empty completion
    Permanent,
}

/// Failure of a single provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = format!("HTTP {} - {}", status, truncate(body, 300));
        if status.is_server_error()
            || status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
        {
            Self::transient(message)
        } else {
            Self::permanent(message)
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::transient(format!("request failed: {}", err))
        } else if let Some(status) = err.status() {
            Self::from_status(status, &err.to_string())
        } else {
            Self::permanent(format!("invalid response: {}", err))
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FailureKind::Transient => "transient",
            FailureKind::Permanent => "permanent",
        };
        write!(f, "{} failure: {}", kind, self.message)
    }
}

impl std::error::Error for ProviderError {}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Uniform capability interface over generation vendors
///
/// Implementations:
/// - `OpenAiCompatible`: OpenAI, Groq and Together chat completions
/// - `AnthropicClient`: Anthropic messages API
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt
    async fn invoke(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError>;

    /// Provider name for logging, e.g. "groq"
    fn name(&self) -> &str;

    /// Model being used
    fn model(&self) -> &str;

    /// `provider/model`, as reported in responses
    fn label(&self) -> String {
        format!("{}/{}", self.name(), self.model())
    }
}
