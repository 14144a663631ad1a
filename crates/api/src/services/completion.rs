//! HTTP completion client for assisted chat mode.
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint. Every failure
//! is reported as a [`CompletionError`]; the chat responder turns it into the
//! fallback reply, so nothing here reaches the HTTP caller.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use domain::services::chat::{PromptMessage, TokenUsage};
use domain::services::{CompletionClient, CompletionError, CompletionOutput, CompletionPrompt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AssistantConfig;

const PRESENCE_PENALTY: f32 = 0.1;
const FREQUENCY_PENALTY: f32 = 0.1;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    max_tokens: u32,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl From<Usage> for TokenUsage {
    fn from(u: Usage) -> Self {
        TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}

pub struct OpenAiCompletionClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompletionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAiCompletionClient {
    /// Builds a client from config. Returns `NotConfigured` without an API key.
    pub fn new(config: &AssistantConfig) -> Result<Self, CompletionError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(CompletionError::NotConfigured)?
            .to_string();

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::ServiceError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, prompt: &'a CompletionPrompt) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: &prompt.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            presence_penalty: PRESENCE_PENALTY,
            frequency_penalty: FREQUENCY_PENALTY,
        }
    }
}

fn parse_output(body: ChatCompletionResponse) -> Result<CompletionOutput, CompletionError> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CompletionError::InvalidResponse("empty completion".into()))?;

    Ok(CompletionOutput {
        content,
        usage: body.usage.map(TokenUsage::from),
    })
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(
        &self,
        prompt: &CompletionPrompt,
    ) -> Result<CompletionOutput, CompletionError> {
        let start = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout
                } else {
                    CompletionError::ServiceError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Completion service returned an error status");
            return Err(CompletionError::ServiceError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        let output = parse_output(body)?;
        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            total_tokens = output.usage.and_then(|u| u.total_tokens),
            "Completion received"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::chat::PromptRole;

    fn config(api_key: Option<&str>) -> AssistantConfig {
        AssistantConfig {
            api_key: api_key.map(str::to_string),
            base_url: "https://llm.example/v1/".into(),
            ..AssistantConfig::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            OpenAiCompletionClient::new(&config(None)),
            Err(CompletionError::NotConfigured)
        ));
        assert!(matches!(
            OpenAiCompletionClient::new(&config(Some("  "))),
            Err(CompletionError::NotConfigured)
        ));
    }

    #[test]
    fn test_endpoint_and_request_body() {
        let client = OpenAiCompletionClient::new(&config(Some("sk-test"))).unwrap();
        assert_eq!(client.endpoint(), "https://llm.example/v1/chat/completions");

        let prompt = CompletionPrompt {
            messages: vec![PromptMessage {
                role: PromptRole::User,
                content: "co je diskriminant".into(),
            }],
        };
        let body = serde_json::to_value(client.request_body(&prompt)).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!((body["presence_penalty"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = OpenAiCompletionClient::new(&config(Some("sk-secret"))).unwrap();
        assert!(!format!("{client:?}").contains("sk-secret"));
    }

    #[test]
    fn test_parse_output() {
        let body: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "  Zkus spočítat b² - 4ac. "}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();
        let out = parse_output(body).unwrap();
        assert_eq!(out.content, "Zkus spočítat b² - 4ac.");
        assert_eq!(out.usage.unwrap().total_tokens, Some(15));
    }

    #[test]
    fn test_parse_output_rejects_empty() {
        let body: ChatCompletionResponse =
            serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        assert!(matches!(
            parse_output(body),
            Err(CompletionError::InvalidResponse(_))
        ));

        let body: ChatCompletionResponse = serde_json::from_value(
            serde_json::json!({"choices": [{"message": {"content": "   "}}]}),
        )
        .unwrap();
        assert!(parse_output(body).is_err());
    }
}
