//! Anthropic messages API client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderConfig;

use super::http::join_url;
use super::llm::{LlmProvider, ProviderError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic client
pub struct AnthropicClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl MessagesResponse {
    /// Concatenated text blocks; other block types are skipped
    fn into_text(self) -> Result<String, ProviderError> {
        let text: String = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(ProviderError::permanent("empty completion"));
        }
        Ok(text)
    }
}

impl AnthropicClient {
    pub fn new(client: Client, config: &ProviderConfig, api_key: String, temperature: f32) -> Self {
        Self {
            client,
            endpoint: join_url(&config.base_url(), "messages"),
            api_key,
            model: config.model_name.clone(),
            temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    async fn invoke(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature: self.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // 529 overloaded is a server error and therefore transient
            return Err(ProviderError::from_status(status, &body));
        }

        let parsed: MessagesResponse = response.json().await?;
        parsed.into_text()
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
