//! OpenAI-compatible chat completions client
//!
//! OpenAI, Groq and Together all expose `POST {base}/chat/completions` with the
//! same request and response shape, so one client serves the three vendors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{ProviderConfig, ProviderKind};

use super::http::join_url;
use super::llm::{LlmProvider, ProviderError};

/// Chat completions client for an OpenAI-compatible vendor
pub struct OpenAiCompatible {
    client: Client,
    kind: ProviderKind,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// First choice's content; a missing or blank completion is not worth retrying
    fn into_text(self) -> Result<String, ProviderError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProviderError::permanent("empty completion"))
    }
}

impl OpenAiCompatible {
    pub fn new(client: Client, config: &ProviderConfig, api_key: String, temperature: f32) -> Self {
        Self {
            client,
            kind: config.provider,
            endpoint: join_url(&config.base_url(), "chat/completions"),
            api_key,
            model: config.model_name.clone(),
            temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatible {
    async fn invoke(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed.into_text()
    }

    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::FailureKind;

    fn parse(value: serde_json::Value) -> Result<String, ProviderError> {
        serde_json::from_value::<ChatResponse>(value).unwrap().into_text()
    }

    #[test]
    fn test_first_choice_content() {
        let text = parse(serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "Final Answer:\nDismissed [1]."}
                },
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"total_tokens": 42}
        }))
        .unwrap();
        assert_eq!(text, "Final Answer:\nDismissed [1].");
    }

    #[test]
    fn test_empty_completion_is_permanent() {
        for body in [
            serde_json::json!({"choices": []}),
            serde_json::json!({}),
            serde_json::json!({"choices": [{"message": {"content": null}}]}),
            serde_json::json!({"choices": [{"message": {"content": "  \n"}}]}),
        ] {
            assert_eq!(parse(body).unwrap_err().kind, FailureKind::Permanent);
        }
    }

    #[test]
    fn test_endpoint_per_vendor() {
        let config = ProviderConfig::new(ProviderKind::Groq, "llama-3.3-70b-versatile");
        let client = OpenAiCompatible::new(Client::new(), &config, "gsk".to_string(), 0.1);
        assert_eq!(client.endpoint, "https://api.groq.com/openai/v1/chat/completions");
        assert_eq!(client.name(), "groq");
    }
}
