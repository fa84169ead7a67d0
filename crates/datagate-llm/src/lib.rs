//! Chat-completions client.
//!
//! Works against any OpenAI-compatible `/chat/completions` endpoint (Mistral,
//! OpenAI, local gateways). One request per call: the instruction goes in the
//! system message, the input in the user message.

use anyhow::Context;
use async_trait::async_trait;
use datagate_core::LlmConfig;
use datagate_runtime::TextGenerator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ChatCompletionsClient {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: api_key.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Build a client, reading the API key from the configured variable.
    pub fn from_config(config: &LlmConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key().with_context(|| {
            format!(
                "LLM API key not set (expected in ${})",
                config.api_key_env
            )
        })?;
        Ok(Self::new(config, api_key))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, instruction: &'a str, input: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content: input,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Text of the first choice.
fn first_choice_content(body: &str) -> anyhow::Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).context("unexpected chat-completions payload")?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("chat-completions response has no content")
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, instruction: &str, input: &str) -> anyhow::Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(instruction, input))
            .send()
            .await
            .context("LLM API call failed")?;

        let status = response.status();
        let body = response.text().await.context("failed to read LLM response")?;
        if !status.is_success() {
            tracing::warn!(status = %status, model = %self.model, "LLM API returned an error");
            anyhow::bail!("LLM API returned {}: {}", status, body);
        }

        tracing::debug!(model = %self.model, bytes = body.len(), "LLM response received");
        first_choice_content(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let config = LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        };
        let client = ChatCompletionsClient::new(&config, "k");
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn request_puts_instruction_in_system_message() {
        let client = ChatCompletionsClient::new(&LlmConfig::default(), "k");
        let body = serde_json::to_value(client.request_body("règles", "question")).unwrap();

        assert_eq!(body["model"], "mistral-large-latest");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "règles");
        assert_eq!(body["messages"][1]["content"], "question");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn first_choice_is_extracted() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"SELECT 1"}}]}"#;
        assert_eq!(first_choice_content(body).unwrap(), "SELECT 1");
    }

    #[test]
    fn missing_choices_is_an_error() {
        assert!(first_choice_content(r#"{"choices":[]}"#).is_err());
        assert!(first_choice_content("not json").is_err());
    }
}
